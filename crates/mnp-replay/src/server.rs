use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use mnp_replay_core::query::{self, QueryError};
use mnp_replay_core::ReplayOutput;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;

const NO_CACHE: &str = "no-cache";
const ONE_WEEK: &str = "public, max-age=604800";

/// The built timeline, loaded once at start-up and shared read-only by every request.
pub struct AppState {
    output: ReplayOutput,
    build_date: String,
}

impl AppState {
    pub fn new(output: ReplayOutput) -> Self {
        let build_date = output
            .metadata
            .as_ref()
            .map(|metadata| metadata.build_date.clone())
            .unwrap_or_else(|| "unknown".to_string());
        Self { output, build_date }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    season: Option<String>,
    week: Option<String>,
    venue: Option<String>,
}

impl TimelineQuery {
    fn season(&self) -> Option<i64> {
        query::parse_query_number(self.season.as_deref())
    }

    fn week(&self) -> Option<i64> {
        query::parse_query_number(self.week.as_deref())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/version", get(version))
        .route("/api/filters", get(filters))
        .route("/api/matches", get(matches))
        .with_state(state)
}

async fn version(State(state): State<Arc<AppState>>) -> Response {
    (
        [(CACHE_CONTROL, NO_CACHE)],
        Json(json!({ "buildDate": state.build_date })),
    )
        .into_response()
}

async fn filters(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimelineQuery>,
) -> Response {
    let filters = query::filters(&state.output, params.season(), params.week());
    ([(CACHE_CONTROL, ONE_WEEK)], Json(filters)).into_response()
}

async fn matches(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimelineQuery>,
) -> Response {
    match query::matches_for(
        &state.output,
        params.season(),
        params.week(),
        params.venue.as_deref(),
    ) {
        Ok(matches) => ([(CACHE_CONTROL, ONE_WEEK)], Json(matches)).into_response(),
        Err(err) => {
            let status = match err {
                QueryError::MissingParameters => StatusCode::BAD_REQUEST,
                QueryError::SeasonNotFound(_) | QueryError::WeekNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
            };
            (
                status,
                [(CACHE_CONTROL, ONE_WEEK)],
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

pub fn load_output(path: &Path) -> Result<ReplayOutput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read timeline {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse timeline {}", path.display()))
}

pub async fn serve(data: &Path, port: u16) -> Result<()> {
    let output = load_output(data)?;
    info!(
        seasons = output.seasons.len(),
        players = output.players.len(),
        "loaded timeline"
    );

    let app = router(Arc::new(AppState::new(output)));
    let listener = TcpListener::bind((std::net::Ipv4Addr::UNSPECIFIED, port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use mnp_replay_core::outputs::{
        assemble_seasons, BuildMetadata, BuildOptions, MachineOutput, MatchOutput, RoundOutput,
        SeatOutput, SkipCounts,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    fn sample_match(matchup: &str, venue: &str, player: &str) -> MatchOutput {
        let (away, home) = matchup.split_once('-').expect("matchup");
        MatchOutput {
            matchup: matchup.into(),
            away: away.into(),
            home: home.into(),
            venue: Some(venue.into()),
            confirm_left: None,
            confirm_right: None,
            rounds: vec![RoundOutput {
                round: 1,
                picking: None,
                responding: None,
                confirm_left: None,
                confirm_right: None,
                machines: vec![MachineOutput {
                    machine: 1,
                    name: "TZ".into(),
                    reported: None,
                    post: None,
                    uid: None,
                    photo_id: None,
                    updates: Vec::new(),
                    duration: None,
                    players: vec![SeatOutput {
                        player: 1,
                        id: player.into(),
                        score: Some("1000".into()),
                        name: None,
                    }],
                }],
            }],
            events: Vec::new(),
        }
    }

    fn app() -> Router {
        let output = ReplayOutput {
            seasons: assemble_seasons(vec![
                ("23".into(), "3".into(), sample_match("AAA-BBB", "T4B", "p1")),
                ("23".into(), "3".into(), sample_match("CCC-DDD", "ADB", "p2")),
                ("22".into(), "1".into(), sample_match("AAA-CCC", "T4B", "p1")),
            ]),
            players: BTreeMap::from([("p1".to_string(), "Alice".to_string())]),
            teams: BTreeMap::new(),
            venues: BTreeMap::new(),
            machines: BTreeMap::new(),
            skipped: SkipCounts::default(),
            metadata: Some(BuildMetadata {
                version: "v1.0.0".into(),
                build_date: "2026-01-02T03:04:05.000Z".into(),
                tool_version: "0.1.0".into(),
                options: BuildOptions {
                    output: "data/mnp-timeline.json".into(),
                    mnp_data_archive: "mnp-data-archive".into(),
                    posts: "data/posts".into(),
                    config: None,
                },
            }),
        };
        router(Arc::new(AppState::new(output)))
    }

    async fn get_json(uri: &str) -> (StatusCode, Option<String>, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let cache = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, cache, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn version_reports_build_date_uncached() {
        let (status, cache, body) = get_json("/api/version").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some(NO_CACHE));
        assert_eq!(body, json!({ "buildDate": "2026-01-02T03:04:05.000Z" }));
    }

    #[tokio::test]
    async fn filters_list_seasons_weeks_and_venues() {
        let (status, cache, body) = get_json("/api/filters?season=23&week=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some(ONE_WEEK));
        assert_eq!(
            body,
            json!({ "seasons": [22, 23], "weeks": [3], "venues": ["ADB", "T4B"] })
        );

        let (_, _, body) = get_json("/api/filters").await;
        assert_eq!(body, json!({ "seasons": [22, 23], "weeks": [], "venues": [] }));
    }

    #[tokio::test]
    async fn matches_resolve_player_names() {
        let (status, _, body) = get_json("/api/matches?season=23&week=3&venue=T4B").await;
        assert_eq!(status, StatusCode::OK);
        let matches = body.as_array().expect("array");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["matchup"], json!("AAA-BBB"));
        let seat = &matches[0]["rounds"][0]["machines"][0]["players"][0];
        assert_eq!(seat["name"], json!("Alice"));
        assert_eq!(seat["score"], json!("1000"));
    }

    #[tokio::test]
    async fn bad_queries_map_to_client_errors() {
        let (status, _, body) = get_json("/api/matches?season=23").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            json!("season and week are required numeric parameters")
        );

        let (status, _, body) = get_json("/api/matches?season=99&week=1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("Season 99 not found"));

        let (status, _, _) = get_json("/api/matches?season=23&week=9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
