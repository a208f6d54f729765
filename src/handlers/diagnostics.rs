use crate::{models::DiagnosticsResponse, AppState};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::{Arc, Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Report loaded tables, live sessions and held locks, plus host load
pub async fn diagnostics(State(app_state): State<Arc<AppState>>) -> (StatusCode, Json<DiagnosticsResponse>) {
    // Aggregate diagnostics from the registry
    let rooms = app_state.registry.rooms().await;
    let n_tables = rooms.len() as u32;
    let mut n_sessions: u32 = 0;
    let mut n_locks: u32 = 0;
    for room in rooms.iter() {
        n_sessions += room.session_count().await as u32;
        n_locks += room.lock_count().await as u32;
    }

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0),
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Tables: {}, Sessions: {}, Locks: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        n_tables,
        n_sessions,
        n_locks
    );

    (
        StatusCode::OK,
        Json(DiagnosticsResponse {
            started_at: app_state.started_at,
            n_tables,
            n_sessions,
            n_locks,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    )
}
