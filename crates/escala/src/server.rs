use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::IntErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::board::{PendingForm, ScheduleBoard};
use crate::error::BoardError;
use crate::html::{self, PageView, Selection};
use crate::types::{Assignment, PendingRow, Period};

/// Everything one browser session edits
pub struct BoardSession {
    pub board: ScheduleBoard,
    pub form: PendingForm,
    pub selection: Selection,
    /// Shown once on the next page render
    pub notice: Option<String>,
}

impl BoardSession {
    pub fn new(selection: Selection) -> Self {
        Self {
            board: ScheduleBoard::new(),
            form: PendingForm::new(),
            selection,
            notice: None,
        }
    }
}

/// Application state shared across requests
pub struct AppState {
    pub session: RwLock<BoardSession>,
}

impl AppState {
    pub fn new(selection: Selection) -> Self {
        Self {
            session: RwLock::new(BoardSession::new(selection)),
        }
    }
}

/// JSON view of the board
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub assignments: Vec<Assignment>,
}

/// Start the web server
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let today = chrono::Local::now().date_naive();
    let state = Arc::new(AppState::new(Selection {
        year: today.year(),
        month: today.month(),
    }));

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(%addr, "Server running");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/generate", post(generate_handler))
        .route("/clear", post(clear_handler))
        .route("/rows/add", post(add_row_handler))
        .route("/rows/{index}/remove", post(remove_row_handler))
        .route("/submit", post(submit_handler))
        .route("/api/board", get(board_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the main HTML page
async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let mut session = state.session.write().await;
    let notice = session.notice.take();
    let markup = html::render_page(&PageView {
        board: &session.board,
        form: &session.form,
        selection: session.selection,
        notice: notice.as_deref(),
    });
    Html(markup.into_string())
}

/// First value posted under `name`
fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn parse_selection(fields: &[(String, String)]) -> Result<Selection, BoardError> {
    let raw_month = field(fields, "month").unwrap_or_default();
    let month = raw_month
        .trim()
        .parse::<u32>()
        .map_err(|_| BoardError::MonthNotANumber(raw_month.to_string()))?;

    let raw_year = field(fields, "year").unwrap_or_default();
    let year = raw_year.trim().parse::<i32>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            BoardError::YearOutOfRange(raw_year.trim().to_string())
        }
        _ => BoardError::InvalidYear(raw_year.to_string()),
    })?;

    Ok(Selection { year, month })
}

/// Keep the session in step with what the browser shows. The month and year
/// are only remembered while they parse; invalid values are reported by
/// `/generate` alone.
fn sync_form(session: &mut BoardSession, fields: &[(String, String)]) {
    session.form.replace_rows(pending_rows(fields));
    if let Ok(selection) = parse_selection(fields) {
        session.selection = selection;
    }
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Redirect {
    let mut session = state.session.write().await;
    session.form.replace_rows(pending_rows(&fields));

    let result = parse_selection(&fields).and_then(|selection| {
        session.board.generate(selection.year, selection.month)?;
        Ok(selection)
    });

    match result {
        Ok(selection) => session.selection = selection,
        Err(e) => {
            warn!(error = %e, "Calendar not generated");
            session.notice = Some(e.to_string());
        }
    }

    Redirect::to("/")
}

async fn clear_handler(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Redirect {
    let mut session = state.session.write().await;
    if let Ok(selection) = parse_selection(&fields) {
        session.selection = selection;
    }
    session.board.clear();
    session.form.reset();
    Redirect::to("/")
}

async fn add_row_handler(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Redirect {
    let mut session = state.session.write().await;
    sync_form(&mut session, &fields);
    session.form.add_row();
    Redirect::to("/")
}

async fn remove_row_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Redirect {
    let mut session = state.session.write().await;
    sync_form(&mut session, &fields);
    if session.form.remove_row(index).is_none() {
        debug!(index, "No pending row to remove");
    }
    Redirect::to("/")
}

async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Redirect {
    let mut session = state.session.write().await;
    sync_form(&mut session, &fields);
    let BoardSession {
        board,
        form,
        notice,
        ..
    } = &mut *session;

    match form.submit(board) {
        Ok(count) => debug!(count, "Pending rows committed"),
        Err(e) => {
            warn!(rows = form.rows().len(), "Submission rejected: no valid days");
            *notice = Some(e.to_string());
        }
    }

    Redirect::to("/")
}

/// Return the board as JSON
async fn board_handler(State(state): State<Arc<AppState>>) -> Json<BoardSnapshot> {
    let session = state.session.read().await;
    let month = session.board.month();
    Json(BoardSnapshot {
        year: month.map(|m| m.year),
        month: month.map(|m| m.month),
        assignments: session.board.assignments().to_vec(),
    })
}

/// Rebuild the draft rows from posted `name-N`, `period-N`, `days-N` and
/// `paid-N` fields. Rows come back in index order; unknown fields are ignored.
fn pending_rows(fields: &[(String, String)]) -> Vec<PendingRow> {
    let mut rows: BTreeMap<usize, PendingRow> = BTreeMap::new();

    for (key, value) in fields {
        let Some((field, index)) = key.rsplit_once('-') else {
            continue;
        };
        let Ok(index) = index.parse::<usize>() else {
            continue;
        };
        if !matches!(field, "name" | "period" | "days" | "paid") {
            continue;
        }

        let row = rows.entry(index).or_default();
        match field {
            "name" => row.name = value.clone(),
            "period" => row.period = Period::from(value.clone()),
            "days" => row.days = value.clone(),
            _ => row.paid_in_cash = true,
        }
    }

    rows.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn new_state() -> Arc<AppState> {
        Arc::new(AppState::new(Selection {
            year: 2025,
            month: 2,
        }))
    }

    async fn post(state: &Arc<AppState>, uri: &str, body: &str) -> StatusCode {
        let response = router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        response.status()
    }

    async fn get_body(state: &Arc<AppState>, uri: &str) -> String {
        let response = router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_pending_rows_from_fields() {
        let fields = vec![
            ("name-1".to_string(), "Bia".to_string()),
            ("name-0".to_string(), "Ana".to_string()),
            ("period-0".to_string(), "Noturno".to_string()),
            ("days-0".to_string(), "1 2".to_string()),
            ("paid-0".to_string(), "on".to_string()),
            ("days-1".to_string(), "3".to_string()),
            ("month".to_string(), "2".to_string()),
        ];

        let rows = pending_rows(&fields);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Ana");
        assert_eq!(rows[0].period, Period::Night);
        assert_eq!(rows[0].days, "1 2");
        assert!(rows[0].paid_in_cash);
        assert_eq!(rows[1].name, "Bia");
        assert_eq!(rows[1].period, Period::Day);
        assert!(!rows[1].paid_in_cash);
    }

    #[test]
    fn test_pending_rows_hyphenated_name_value() {
        let fields = vec![("name-0".to_string(), "Ana-Maria".to_string())];
        assert_eq!(pending_rows(&fields)[0].name, "Ana-Maria");
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let state = new_state();
        let body = get_body(&state, "/").await;

        assert!(body.contains("Adicionar Profissionais"));
        assert!(body.contains(r#"<option value="2" selected>fevereiro</option>"#));
    }

    #[tokio::test]
    async fn test_generate_and_submit_flow() {
        let state = new_state();

        assert_eq!(
            post(&state, "/generate", "month=2&year=2025").await,
            StatusCode::SEE_OTHER
        );
        assert_eq!(
            post(&state, "/submit", "name-0=Ana&period-0=Diurno&days-0=5%2C6%2C7").await,
            StatusCode::SEE_OTHER
        );
        post(&state, "/submit", "name-0=Bia&period-0=Diurno&days-0=5").await;

        let body = get_body(&state, "/").await;
        assert!(body.contains("fevereiro 2025"));
        assert!(body.contains(r#"style="color: blue">Ana</div>"#));
        assert_eq!(body.matches("class=\"conflict\"").count(), 1);

        let session = state.session.read().await;
        assert_eq!(session.board.for_day(5).len(), 2);
        assert_eq!(session.form, PendingForm::default());
    }

    #[tokio::test]
    async fn test_submit_rejected_shows_notice_once() {
        let state = new_state();
        post(&state, "/submit", "name-0=Ana&period-0=Diurno&days-0=0%2C+-1").await;

        {
            let session = state.session.read().await;
            assert!(session.board.assignments().is_empty());
            assert_eq!(session.form.rows()[0].name, "Ana");
        }

        let body = get_body(&state, "/").await;
        assert!(body.contains("insira dias válidos"));

        let body = get_body(&state, "/").await;
        assert!(!body.contains("role=\"alert\""));
    }

    #[tokio::test]
    async fn test_generate_invalid_input_sets_notice() {
        let state = new_state();
        post(&state, "/generate", "month=13&year=2025").await;
        post(&state, "/generate", "month=3&year=abc").await;

        let session = state.session.read().await;
        assert!(session.board.month().is_none());
        assert_eq!(session.selection, Selection { year: 2025, month: 2 });
        assert!(session.notice.as_deref().unwrap().contains("abc"));
    }

    #[tokio::test]
    async fn test_generate_reports_raw_month_and_oversized_year() {
        let state = new_state();

        post(&state, "/generate", "month=abc&year=2025").await;
        let notice = state.session.write().await.notice.take().unwrap();
        assert_eq!(notice, BoardError::MonthNotANumber("abc".to_string()).to_string());
        assert!(notice.contains("\"abc\""));

        post(&state, "/generate", "month=3&year=99999999999").await;
        let notice = state.session.write().await.notice.take().unwrap();
        assert_eq!(
            notice,
            BoardError::YearOutOfRange("99999999999".to_string()).to_string()
        );
    }

    #[tokio::test]
    async fn test_generate_keeps_typed_rows() {
        let state = new_state();
        post(
            &state,
            "/generate",
            "month=3&year=2024&name-0=Ana&period-0=Noturno&days-0=5&paid-0=on",
        )
        .await;

        let session = state.session.read().await;
        assert_eq!(session.board.month().map(|m| m.month), Some(3));
        assert_eq!(session.form.rows()[0].name, "Ana");
        assert_eq!(session.form.rows()[0].days, "5");
        assert!(session.form.rows()[0].paid_in_cash);
        assert!(session.board.assignments().is_empty());
    }

    #[tokio::test]
    async fn test_row_actions_keep_typed_selection() {
        let state = new_state();
        post(&state, "/rows/add", "month=7&year=2026&name-0=Ana").await;

        {
            let session = state.session.read().await;
            assert_eq!(session.selection, Selection { year: 2026, month: 7 });
            assert!(session.board.month().is_none());
        }

        post(&state, "/submit", "month=8&year=2026&name-0=Ana&days-0=xyz").await;

        let body = get_body(&state, "/").await;
        assert!(body.contains(r#"<option value="8" selected>agosto</option>"#));
        assert!(body.contains(r#"value="2026""#));
        assert!(body.contains(r#"name="name-0" value="Ana""#));
    }

    #[tokio::test]
    async fn test_row_add_and_remove_keep_values() {
        let state = new_state();
        post(&state, "/rows/add", "name-0=Ana&period-0=Noturno&days-0=1").await;

        {
            let session = state.session.read().await;
            assert_eq!(session.form.rows().len(), 2);
            assert_eq!(session.form.rows()[0].name, "Ana");
            assert_eq!(session.form.rows()[0].period, Period::Night);
        }

        post(&state, "/rows/0/remove", "name-0=Ana&name-1=Bia").await;

        let session = state.session.read().await;
        assert_eq!(session.form.rows().len(), 1);
        assert_eq!(session.form.rows()[0].name, "Bia");
    }

    #[tokio::test]
    async fn test_clear_resets_board_and_form() {
        let state = new_state();
        post(&state, "/generate", "month=3&year=2024").await;
        post(&state, "/submit", "name-0=Ana&days-0=15+16").await;
        post(&state, "/rows/add", "name-0=Caio").await;

        post(&state, "/clear", "").await;

        let session = state.session.read().await;
        assert!(session.board.month().is_none());
        assert!(session.board.for_day(15).is_empty());
        assert_eq!(session.form, PendingForm::default());
    }

    #[tokio::test]
    async fn test_board_api_snapshot() {
        let state = new_state();
        post(&state, "/generate", "month=3&year=2024").await;
        post(&state, "/submit", "name-0=Ana&period-0=Noturno&days-0=15+16&paid-0=on").await;

        let body = get_body(&state, "/api/board").await;
        let snapshot: BoardSnapshot = serde_json::from_str(&body).unwrap();

        assert_eq!(snapshot.year, Some(2024));
        assert_eq!(snapshot.month, Some(3));
        assert_eq!(
            snapshot.assignments,
            vec![Assignment::new("Ana", Period::Night, vec![15, 16], true)]
        );
    }
}
