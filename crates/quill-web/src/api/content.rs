//! Dictionary, category, tag, post and page CRUD.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use quill_core::{Article, Category, Dict, Global, Tag};

use crate::dto::*;
use crate::error::AppError;
use crate::state::AppState;

type Res<T> = Result<Json<Reply<T>>, AppError>;

pub async fn dict_all(State(state): State<AppState>) -> Json<Reply<Vec<Dict>>> {
    succ("succ", state.content.dicts.list())
}

pub async fn dict_add(State(state): State<AppState>, Input(body): Input<Dict>) -> Res<Dict> {
    Ok(succ("succ", state.content.dicts.add(body)?))
}

pub async fn dict_edit(State(state): State<AppState>, Input(body): Input<Dict>) -> Res<Dict> {
    Ok(succ("succ", state.content.dicts.edit(body)?))
}

pub async fn dict_drop(State(state): State<AppState>, Input(body): Input<IdRequest>) -> Res<Dict> {
    Ok(succ("succ", state.content.dicts.drop(body.id)?))
}

pub async fn cate_all(State(state): State<AppState>) -> Json<Reply<Vec<Category>>> {
    succ("succ", state.content.categories.list())
}

pub async fn cate_add(State(state): State<AppState>, Input(body): Input<Category>) -> Res<Category> {
    Ok(succ("succ", state.content.categories.add(body)?))
}

pub async fn cate_edit(State(state): State<AppState>, Input(body): Input<Category>) -> Res<Category> {
    Ok(succ("succ", state.content.categories.edit(body)?))
}

pub async fn cate_drop(State(state): State<AppState>, Input(body): Input<IdRequest>) -> Res<Category> {
    Ok(succ("succ", state.content.drop_category(body.id)?))
}

pub async fn tag_all(State(state): State<AppState>) -> Json<Reply<Vec<Tag>>> {
    succ("succ", state.content.tags.list())
}

pub async fn tag_add(State(state): State<AppState>, Input(body): Input<Tag>) -> Res<Tag> {
    Ok(succ("succ", state.content.tags.add(body)?))
}

pub async fn tag_edit(State(state): State<AppState>, Input(body): Input<Tag>) -> Res<Tag> {
    Ok(succ("succ", state.content.tags.edit(body)?))
}

pub async fn tag_drop(State(state): State<AppState>, Input(body): Input<IdRequest>) -> Res<Tag> {
    Ok(succ("succ", state.content.drop_tag(body.id)?))
}

pub async fn post_all(State(state): State<AppState>) -> Json<Reply<Vec<Article>>> {
    succ("succ", state.content.posts.list())
}

pub async fn post_add(State(state): State<AppState>, Input(body): Input<Article>) -> Res<Article> {
    Ok(succ("succ", state.content.add_post(body, Utc::now())?))
}

pub async fn post_edit(State(state): State<AppState>, Input(body): Input<Article>) -> Res<Article> {
    Ok(succ("succ", state.content.edit_post(body, Utc::now())?))
}

pub async fn post_drop(State(state): State<AppState>, Input(body): Input<IdRequest>) -> Res<Article> {
    Ok(succ("succ", state.content.posts.drop(body.id)?))
}

pub async fn page_all(State(state): State<AppState>) -> Json<Reply<Vec<Article>>> {
    succ("succ", state.content.pages.list())
}

pub async fn page_add(State(state): State<AppState>, Input(body): Input<Article>) -> Res<Article> {
    Ok(succ("succ", state.content.add_page(body, Utc::now())?))
}

pub async fn page_edit(State(state): State<AppState>, Input(body): Input<Article>) -> Res<Article> {
    Ok(succ("succ", state.content.edit_page(body, Utc::now())?))
}

pub async fn page_drop(State(state): State<AppState>, Input(body): Input<IdRequest>) -> Res<Article> {
    Ok(succ("succ", state.content.pages.drop(body.id)?))
}

pub async fn global_get(State(state): State<AppState>) -> Json<Reply<Global>> {
    succ("succ", state.content.global())
}

pub async fn global_edit(State(state): State<AppState>, Input(body): Input<Global>) -> Json<Reply<Global>> {
    state.content.set_global(body.clone());
    tracing::info!("Global settings updated");
    succ("succ", body)
}
