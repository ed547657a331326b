//! HTML pages: archive, plant, system, comparison and upload.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Extension,
};
use futures::future::try_join_all;
use pidview_core::{
    derive_comparison, filter_and_sort, natural_cmp, Comparison, Extraction, FileEntry, Folder,
    SortKey,
};
use serde::Deserialize;

use crate::auth::SessionUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::views::{self, ComparisonView, Listing};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
}

impl ListQuery {
    fn query(&self) -> &str {
        self.q.as_deref().unwrap_or("")
    }

    fn sort(&self) -> SortKey {
        SortKey::from_query(self.sort.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ComparisonQuery {
    pub pdf: Option<String>,
}

async fn load_archive(state: &AppState) -> Result<Vec<Folder>, HttpAppError> {
    let root = state.config.archive_folder_id()?;
    Ok(state.drive.list_folders(root).await?)
}

pub async fn archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<ListQuery>,
) -> Response {
    match load_archive(&state).await {
        Ok(folders) => {
            let items = filter_and_sort(&folders, query.query(), query.sort());
            Html(views::archive_page(
                &user,
                Listing {
                    items: &items,
                    total: folders.len(),
                    query: query.query(),
                    sort: query.sort(),
                },
            ))
            .into_response()
        }
        Err(err) => views::failure_page("Archive", &user, "Could not load the archive.", err),
    }
}

pub async fn plant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(plant_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    match state.drive.list_folders(&plant_id).await {
        Ok(folders) => {
            let items = filter_and_sort(&folders, query.query(), query.sort());
            Html(views::plant_page(
                &user,
                &plant_id,
                Listing {
                    items: &items,
                    total: folders.len(),
                    query: query.query(),
                    sort: query.sort(),
                },
            ))
            .into_response()
        }
        Err(err) => views::failure_page(
            "Systems",
            &user,
            "Could not load plant details.",
            err.into(),
        ),
    }
}

/// Child folders of a system with their files resolved into comparisons.
async fn load_comparisons(state: &AppState, system_id: &str) -> Result<Vec<Comparison>, HttpAppError> {
    let folders = state.drive.list_folders(system_id).await?;
    let comparisons = try_join_all(folders.iter().map(|folder| async move {
        let files = state.drive.list_files(&folder.id).await?;
        Ok::<_, HttpAppError>(derive_comparison(folder, &files))
    }))
    .await?;
    Ok(comparisons)
}

pub async fn system(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(system_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    match load_comparisons(&state, &system_id).await {
        Ok(comparisons) => {
            let items = filter_and_sort(&comparisons, query.query(), query.sort());
            Html(views::system_page(
                &user,
                &system_id,
                Listing {
                    items: &items,
                    total: comparisons.len(),
                    query: query.query(),
                    sort: query.sort(),
                },
            ))
            .into_response()
        }
        Err(err) => views::failure_page("Comparisons", &user, "Could not load comparisons.", err),
    }
}

struct ComparisonFiles {
    pdfs: Vec<FileEntry>,
    report: Option<Extraction>,
}

async fn load_comparison(state: &AppState, folder_id: &str) -> Result<ComparisonFiles, HttpAppError> {
    let files = state.drive.list_files(folder_id).await?;

    let report = match files.iter().find(|f| f.is_html()) {
        Some(html) => {
            let raw = state.drive.download_text(&html.id).await?;
            Some(Extraction::parse(&raw))
        }
        None => None,
    };

    let mut pdfs: Vec<FileEntry> = files.into_iter().filter(FileEntry::is_pdf).collect();
    pdfs.sort_by(|a, b| natural_cmp(&a.name, &b.name));

    Ok(ComparisonFiles { pdfs, report })
}

pub async fn comparison(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(folder_id): Path<String>,
    Query(query): Query<ComparisonQuery>,
) -> Response {
    match load_comparison(&state, &folder_id).await {
        Ok(files) => {
            let selected = query
                .pdf
                .as_deref()
                .and_then(|p| p.parse::<usize>().ok())
                .filter(|&i| i < files.pdfs.len())
                .unwrap_or(0);
            Html(views::comparison_page(
                &user,
                ComparisonView {
                    folder_id: &folder_id,
                    pdfs: &files.pdfs,
                    selected,
                    report: files.report.as_ref(),
                },
            ))
            .into_response()
        }
        Err(err) => views::failure_page(
            "Comparison",
            &user,
            "Failed to load comparison details.",
            err,
        ),
    }
}

pub async fn upload(Extension(user): Extension<SessionUser>) -> Html<String> {
    Html(views::upload_page(&user))
}
