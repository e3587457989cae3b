use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::TypedHeader;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use uuid::Uuid;

use frutinha_core::{resolve, GridLayout, RandomReels, Symbol, SymbolCatalog, WinSet};
use frutinha_shared::{
    CreatePlayerRequest, PlayerResponse, SpinRecord, SpinRequest, SpinResponse, SymbolDto,
    UpsertSymbolRequest, WinDto,
};

const MIN_BET: Decimal = dec!(0.01);
const DEFAULT_OPENING_BALANCE: Decimal = dec!(1000.00);

/// Spins that lose the compare-and-swap race to a concurrent spin for the
/// same player re-read and retry this many times before giving up.
const CAS_ATTEMPTS: u32 = 16;

#[derive(Clone)]
struct AppState {
    db: SqlitePool,
    api_key: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PlayerRow {
    id: String,
    name: String,
    balance: String,
    total_wagered: String,
    total_won: String,
}

fn internal<E: std::fmt::Display>(e: E) -> StatusCode {
    error!("internal error: {e}");
    StatusCode::INTERNAL_SERVER_ERROR
}

fn money(text: &str) -> Result<Decimal, StatusCode> {
    text.parse::<Decimal>().map_err(|e| {
        error!("corrupt money value `{text}`: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

fn win_set_dto(win_set: &WinSet) -> BTreeMap<u32, WinDto> {
    win_set
        .iter()
        .map(|(row, win)| {
            (
                *row,
                WinDto {
                    symbol: win.symbol.clone(),
                    run: win.run.clone(),
                },
            )
        })
        .collect()
}

fn player_response(row: PlayerRow) -> Result<PlayerResponse, StatusCode> {
    Ok(PlayerResponse {
        id: Uuid::parse_str(&row.id).map_err(internal)?,
        name: row.name,
        balance: money(&row.balance)?,
        total_wagered: money(&row.total_wagered)?,
        total_won: money(&row.total_won)?,
    })
}

async fn load_catalog(db: &SqlitePool) -> anyhow::Result<SymbolCatalog> {
    let rows = sqlx::query("SELECT name, payout_multiplier FROM symbols ORDER BY name")
        .fetch_all(db)
        .await?;
    let mut symbols = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.get("name");
        let multiplier: String = row.get("payout_multiplier");
        symbols.push(Symbol {
            name,
            payout_multiplier: multiplier.parse()?,
        });
    }
    Ok(SymbolCatalog(symbols))
}

async fn fetch_player(db: &SqlitePool, id: &str) -> Result<Option<PlayerRow>, StatusCode> {
    sqlx::query_as::<_, PlayerRow>(
        "SELECT id, name, balance, total_wagered, total_won FROM players WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .map_err(internal)
}

/// One spin as a single unit of work: a funds-guarded compare-and-swap on
/// the player row plus the spin-record insert, committed together. Losing
/// the swap means a concurrent spin settled first; the resolution is
/// untouched by the retry, only the balance read is repeated.
async fn route_spin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpinRequest>,
) -> Result<Json<SpinResponse>, StatusCode> {
    if req.bet < MIN_BET {
        return Err(StatusCode::BAD_REQUEST);
    }
    let catalog = load_catalog(&state.db).await.map_err(|e| {
        error!("catalog load failed: {e:#}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let mut reels = RandomReels::from_entropy();
    let resolution =
        resolve(&mut reels, &catalog, GridLayout::default(), req.bet).map_err(|e| {
            error!("spin resolution failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let player_id = req.player_id.to_string();
    for _ in 0..CAS_ATTEMPTS {
        let Some(row) = fetch_player(&state.db, &player_id).await? else {
            return Err(StatusCode::NOT_FOUND);
        };
        let balance = money(&row.balance)?;
        if balance < req.bet {
            return Ok(Json(SpinResponse::declined("insufficient funds")));
        }
        let balance_after = balance - req.bet + resolution.payout;
        let wagered_after = money(&row.total_wagered)? + req.bet;
        let won_after = money(&row.total_won)? + resolution.payout;

        let mut tx = state.db.begin().await.map_err(internal)?;
        let swapped = sqlx::query(
            "UPDATE players SET balance = ?, total_wagered = ?, total_won = ? \
             WHERE id = ? AND balance = ? AND total_wagered = ? AND total_won = ?",
        )
        .bind(balance_after.to_string())
        .bind(wagered_after.to_string())
        .bind(won_after.to_string())
        .bind(&row.id)
        .bind(&row.balance)
        .bind(&row.total_wagered)
        .bind(&row.total_won)
        .execute(&mut *tx)
        .await
        .map_err(internal)?;
        if swapped.rows_affected() == 0 {
            tx.rollback().await.map_err(internal)?;
            continue;
        }

        let spin_id = Uuid::new_v4();
        let grid_json = serde_json::to_string(resolution.grid.reels()).map_err(internal)?;
        let wins_json = match resolution.win_set.as_ref() {
            Some(wins) => Some(serde_json::to_string(&win_set_dto(wins)).map_err(internal)?),
            None => None,
        };
        sqlx::query(
            "INSERT INTO spins (id, player_id, ts, bet_amount, payout, grid_json, wins_json) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(spin_id.to_string())
        .bind(&row.id)
        .bind(Utc::now().to_rfc3339())
        .bind(req.bet.to_string())
        .bind(resolution.payout.to_string())
        .bind(grid_json)
        .bind(wins_json)
        .execute(&mut *tx)
        .await
        .map_err(internal)?;
        tx.commit().await.map_err(internal)?;

        return Ok(Json(SpinResponse {
            success: true,
            spin_id: Some(spin_id),
            grid: Some(resolution.grid.reels().to_vec()),
            win_set: resolution.win_set.as_ref().map(win_set_dto),
            payout: Some(resolution.payout),
            balance_after: Some(balance_after),
            reason: None,
        }));
    }

    error!("spin for {player_id} still contended after {CAS_ATTEMPTS} attempts");
    Err(StatusCode::SERVICE_UNAVAILABLE)
}

async fn route_create_player(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePlayerRequest>,
) -> Result<(StatusCode, Json<PlayerResponse>), StatusCode> {
    let opening = req.opening_balance.unwrap_or(DEFAULT_OPENING_BALANCE);
    if opening < Decimal::ZERO {
        return Err(StatusCode::BAD_REQUEST);
    }
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO players (id, name, balance, total_wagered, total_won, created_at) \
         VALUES (?, ?, ?, '0.00', '0.00', ?)",
    )
    .bind(id.to_string())
    .bind(&req.name)
    .bind(opening.to_string())
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await
    .map_err(internal)?;
    Ok((
        StatusCode::CREATED,
        Json(PlayerResponse {
            id,
            name: req.name,
            balance: opening,
            total_wagered: Decimal::ZERO,
            total_won: Decimal::ZERO,
        }),
    ))
}

async fn route_get_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerResponse>, StatusCode> {
    let Some(row) = fetch_player(&state.db, &id.to_string()).await? else {
        return Err(StatusCode::NOT_FOUND);
    };
    Ok(Json(player_response(row)?))
}

async fn route_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SpinRecord>>, StatusCode> {
    if fetch_player(&state.db, &id.to_string()).await?.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    let rows = sqlx::query(
        "SELECT id, ts, bet_amount, payout, grid_json, wins_json FROM spins \
         WHERE player_id = ? ORDER BY ts DESC",
    )
    .bind(id.to_string())
    .fetch_all(&state.db)
    .await
    .map_err(internal)?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let spin_id: String = row.get("id");
        let ts: String = row.get("ts");
        let bet: String = row.get("bet_amount");
        let payout: String = row.get("payout");
        let grid_json: String = row.get("grid_json");
        let wins_json: Option<String> = row.get("wins_json");
        records.push(SpinRecord {
            id: Uuid::parse_str(&spin_id).map_err(internal)?,
            ts: DateTime::parse_from_rfc3339(&ts)
                .map_err(internal)?
                .with_timezone(&Utc),
            bet_amount: money(&bet)?,
            payout: money(&payout)?,
            grid: serde_json::from_str(&grid_json).map_err(internal)?,
            win_set: match wins_json {
                Some(json) => Some(serde_json::from_str(&json).map_err(internal)?),
                None => None,
            },
        });
    }
    Ok(Json(records))
}

async fn route_symbols(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SymbolDto>>, StatusCode> {
    let catalog = load_catalog(&state.db).await.map_err(internal)?;
    Ok(Json(
        catalog
            .0
            .into_iter()
            .map(|s| SymbolDto {
                name: s.name,
                payout_multiplier: s.payout_multiplier,
            })
            .collect(),
    ))
}

async fn route_admin_upsert_symbol(
    State(state): State<Arc<AppState>>,
    TypedHeader(axum_extra::headers::Authorization(bearer)): TypedHeader<
        axum_extra::headers::Authorization<axum_extra::headers::authorization::Bearer>,
    >,
    Json(req): Json<UpsertSymbolRequest>,
) -> Result<StatusCode, StatusCode> {
    if bearer.token() != state.api_key {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if req.payout_multiplier < Decimal::ZERO {
        return Err(StatusCode::BAD_REQUEST);
    }
    sqlx::query(
        "INSERT INTO symbols (name, payout_multiplier) VALUES (?, ?) \
         ON CONFLICT(name) DO UPDATE SET payout_multiplier = excluded.payout_multiplier",
    )
    .bind(&req.name)
    .bind(req.payout_multiplier.to_string())
    .execute(&state.db)
    .await
    .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(
            &std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://frutinha.db?mode=rwc".to_string()),
        )
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let state = Arc::new(AppState {
        db,
        api_key: std::env::var("API_KEY").unwrap_or_else(|_| "dev-key".into()),
    });

    let app = Router::new()
        .route("/spin", post(route_spin))
        .route("/players", post(route_create_player))
        .route("/players/:id", get(route_get_player))
        .route("/players/:id/spins", get(route_history))
        .route("/symbols", get(route_symbols))
        .route("/admin/symbols", post(route_admin_upsert_symbol))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = std::env::var("BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
