use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use uuid::Uuid;

use frutinha_core::{GridLayout, RandomReels, SlotMachine, SpinOutcome, Symbol, SymbolCatalog};

#[derive(Parser)]
#[command(name = "frutinha-cli", about = "Admin CLI for the frutinha server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Database URL, default sqlite://frutinha.db
    #[arg(long, value_parser, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a symbol to the catalog, or update its multiplier
    AddSymbol {
        name: String,
        payout_multiplier: Decimal,
    },
    /// List the symbol catalog
    ListSymbols,
    /// Create a player account
    CreatePlayer {
        name: String,
        #[arg(long, default_value = "1000.00")]
        balance: Decimal,
    },
    /// Credit a player's balance
    Credit { player_id: Uuid, amount: Decimal },
    /// View last N spins
    ViewSpins {
        #[arg(default_value_t = 20)]
        n: i64,
    },
    /// Export spins to CSV path
    ExportCsv { path: String },
    /// Run offline spins against the in-process engine and report RTP
    Simulate {
        #[arg(long, default_value_t = 1000)]
        spins: u32,
        #[arg(long, default_value = "1.00")]
        bet: Decimal,
        #[arg(long)]
        seed: Option<u64>,
    },
}

async fn get_pool(url: Option<String>) -> anyhow::Result<SqlitePool> {
    let url = url.unwrap_or_else(|| "sqlite://frutinha.db?mode=rwc".into());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;
    Ok(pool)
}

async fn load_catalog(pool: &SqlitePool) -> anyhow::Result<SymbolCatalog> {
    let rows = sqlx::query("SELECT name, payout_multiplier FROM symbols ORDER BY name")
        .fetch_all(pool)
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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let pool = get_pool(cli.database_url).await?;

    match cli.command {
        Commands::AddSymbol {
            name,
            payout_multiplier,
        } => {
            if payout_multiplier < Decimal::ZERO {
                bail!("payout multiplier must be >= 0");
            }
            sqlx::query(
                "INSERT INTO symbols (name, payout_multiplier) VALUES (?, ?) \
                 ON CONFLICT(name) DO UPDATE SET payout_multiplier = excluded.payout_multiplier",
            )
            .bind(&name)
            .bind(payout_multiplier.to_string())
            .execute(&pool)
            .await?;
            println!("Symbol {} pays x{}", name, payout_multiplier);
        }
        Commands::ListSymbols => {
            let catalog = load_catalog(&pool).await?;
            for symbol in &catalog.0 {
                println!("{:<12} x{}", symbol.name, symbol.payout_multiplier);
            }
        }
        Commands::CreatePlayer { name, balance } => {
            if balance < Decimal::ZERO {
                bail!("opening balance must be >= 0");
            }
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO players (id, name, balance, total_wagered, total_won, created_at) \
                 VALUES (?, ?, ?, '0.00', '0.00', ?)",
            )
            .bind(id.to_string())
            .bind(&name)
            .bind(balance.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&pool)
            .await?;
            println!("Created player {} with id {} and balance {}", name, id, balance);
        }
        Commands::Credit { player_id, amount } => {
            if amount <= Decimal::ZERO {
                bail!("credit amount must be positive");
            }
            // compare-and-swap so a credit never tramples a concurrent spin
            loop {
                let row = sqlx::query("SELECT balance FROM players WHERE id = ?")
                    .bind(player_id.to_string())
                    .fetch_optional(&pool)
                    .await?;
                let Some(row) = row else {
                    bail!("unknown player {player_id}");
                };
                let balance: String = row.get("balance");
                let updated = balance.parse::<Decimal>()? + amount;
                let swapped =
                    sqlx::query("UPDATE players SET balance = ? WHERE id = ? AND balance = ?")
                        .bind(updated.to_string())
                        .bind(player_id.to_string())
                        .bind(&balance)
                        .execute(&pool)
                        .await?;
                if swapped.rows_affected() == 1 {
                    println!("New balance: {updated}");
                    break;
                }
            }
        }
        Commands::ViewSpins { n } => {
            let rows = sqlx::query(
                "SELECT id, player_id, ts, bet_amount, payout FROM spins ORDER BY ts DESC LIMIT ?",
            )
            .bind(n)
            .fetch_all(&pool)
            .await?;
            for r in rows {
                let id: String = r.get("id");
                let player_id: String = r.get("player_id");
                let ts: String = r.get("ts");
                let bet: String = r.get("bet_amount");
                let payout: String = r.get("payout");
                println!("{} {} player={} bet={} payout={}", id, ts, player_id, bet, payout);
            }
        }
        Commands::ExportCsv { path } => {
            let mut wtr = csv::Writer::from_path(&path)?;
            let rows = sqlx::query(
                "SELECT id, player_id, ts, bet_amount, payout, grid_json, wins_json FROM spins \
                 ORDER BY ts ASC",
            )
            .fetch_all(&pool)
            .await?;
            let total = rows.len();
            wtr.write_record([
                "id",
                "player_id",
                "ts",
                "bet_amount",
                "payout",
                "grid_json",
                "wins_json",
            ])?;
            for r in &rows {
                wtr.write_record(&[
                    r.get::<String, _>("id"),
                    r.get::<String, _>("player_id"),
                    r.get::<String, _>("ts"),
                    r.get::<String, _>("bet_amount"),
                    r.get::<String, _>("payout"),
                    r.get::<String, _>("grid_json"),
                    r.get::<Option<String>, _>("wins_json").unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
            println!("Exported {} rows to {}", total, path);
        }
        Commands::Simulate { spins, bet, seed } => {
            if spins == 0 {
                bail!("nothing to simulate");
            }
            if bet <= Decimal::ZERO {
                bail!("bet must be positive");
            }
            let mut catalog = load_catalog(&pool).await?;
            if catalog.is_empty() {
                catalog = SymbolCatalog::classic();
            }
            let reels = match seed {
                Some(seed) => RandomReels::seeded(seed),
                None => RandomReels::from_entropy(),
            };
            let machine = SlotMachine::new(catalog, GridLayout::default(), reels);
            let stake = bet * Decimal::from(spins);
            let player = machine.ledger().open_account(stake);
            let mut total_payout = Decimal::ZERO;
            let mut hits = 0u32;
            for _ in 0..spins {
                match machine.play(player, bet)? {
                    SpinOutcome::Completed(receipt) => {
                        if receipt.payout > Decimal::ZERO {
                            hits += 1;
                        }
                        total_payout += receipt.payout;
                    }
                    SpinOutcome::Declined { .. } => break,
                }
            }
            println!(
                "{} spins at {}: wagered {}, paid out {} ({} winning spins)",
                spins, bet, stake, total_payout, hits
            );
            println!("RTP: {}", (total_payout / stake).round_dp(4));
        }
    }

    Ok(())
}
