use axum::extract::State;
use axum::Json;

use crate::dto::{succ, ContentStats, Reply, RuntimeInfo};
use crate::state::AppState;

pub async fn runtime_info(State(state): State<AppState>) -> Json<Reply<RuntimeInfo>> {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    succ(
        "succ",
        RuntimeInfo {
            version: env!("CARGO_PKG_VERSION"),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            cpus,
            uptime_secs: state.started_at.elapsed().as_secs(),
        },
    )
}

pub async fn app_info(State(state): State<AppState>) -> Json<Reply<ContentStats>> {
    let content = &state.content;
    succ(
        "succ",
        ContentStats {
            posts: content.posts.len(),
            pages: content.pages.len(),
            cates: content.categories.len(),
            tags: content.tags.len(),
            dicts: content.dicts.len(),
        },
    )
}
