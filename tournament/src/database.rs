// ═══════════════════════════════════════════════════════════════════════
// Database — SQLite storage for battle results and bot win rates
// ═══════════════════════════════════════════════════════════════════════

use rusqlite::{params, Connection, Result};
use serde::{Deserialize, Serialize};

use crate::runner::BattleResult;
use warband_engine::types::Side;

pub struct Database {
    conn: Connection,
}

/// Aggregate record for one bot across every stored battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinRate {
    pub name: String,
    pub battles: u32,
    pub wins: u32,
    pub draws: u32,
}

impl WinRate {
    pub fn win_rate(&self) -> f64 {
        if self.battles == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.battles)
        }
    }
}

impl Database {
    /// Open (or create) a database at the given path.
    pub fn new(path: &str) -> Result<Self> {
        let db = Database { conn: Connection::open(path)? };
        db.create_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let db = Database { conn: Connection::open_in_memory()? };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch("
            CREATE TABLE IF NOT EXISTS bots (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                battles     INTEGER NOT NULL DEFAULT 0,
                wins        INTEGER NOT NULL DEFAULT 0,
                draws       INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS battles (
                id                INTEGER PRIMARY KEY,
                seed              INTEGER NOT NULL,
                rounds            INTEGER NOT NULL,
                decisions         INTEGER NOT NULL,
                winner            TEXT,
                attacker_bot      INTEGER NOT NULL REFERENCES bots(id),
                defender_bot      INTEGER NOT NULL REFERENCES bots(id),
                attacker_culture  TEXT NOT NULL,
                defender_culture  TEXT NOT NULL,
                attacker_hp       INTEGER NOT NULL,
                defender_hp       INTEGER NOT NULL,
                environment       TEXT NOT NULL,
                played_at         TEXT NOT NULL DEFAULT (datetime('now'))
            );
        ")
    }

    /// Register a bot (or return the existing ID).
    pub fn register_bot(&self, name: &str) -> Result<i64> {
        self.conn.execute("INSERT OR IGNORE INTO bots (name) VALUES (?1)", params![name])?;
        self.conn.query_row("SELECT id FROM bots WHERE name = ?1", params![name], |row| row.get(0))
    }

    /// Store a completed battle and update both bots' tallies.
    /// Returns the new battle ID.
    pub fn store_battle(&mut self, result: &BattleResult) -> Result<i64> {
        let attacker = result.side(Side::Attacker);
        let defender = result.side(Side::Defender);
        let attacker_id = self.register_bot(&attacker.agent_name)?;
        let defender_id = self.register_bot(&defender.agent_name)?;
        let environment = serde_json::to_string(&result.environment)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO battles (seed, rounds, decisions, winner, attacker_bot, defender_bot,
                                  attacker_culture, defender_culture, attacker_hp, defender_hp, environment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                result.seed as i64,
                result.rounds_played,
                result.decisions as i64,
                result.winner().map(|s| s.to_string()),
                attacker_id,
                defender_id,
                attacker.culture.to_string(),
                defender.culture.to_string(),
                attacker.final_hp,
                defender.final_hp,
                environment,
            ],
        )?;
        let battle_id = tx.last_insert_rowid();

        for (side, bot_id) in [(Side::Attacker, attacker_id), (Side::Defender, defender_id)] {
            let won = result.winner() == Some(side);
            let drawn = result.winner().is_none();
            tx.execute(
                "UPDATE bots SET battles = battles + 1, wins = wins + ?1, draws = draws + ?2 WHERE id = ?3",
                params![u32::from(won), u32::from(drawn), bot_id],
            )?;
        }
        tx.commit()?;
        Ok(battle_id)
    }

    /// Win rates, best first.
    pub fn win_rates(&self) -> Result<Vec<WinRate>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, battles, wins, draws FROM bots
             ORDER BY CAST(wins AS REAL) / MAX(battles, 1) DESC, name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WinRate {
                name: row.get(0)?,
                battles: row.get(1)?,
                wins: row.get(2)?,
                draws: row.get(3)?,
            })
        })?;
        rows.collect()
    }

    pub fn battle_count(&self) -> Result<u32> {
        self.conn.query_row("SELECT COUNT(*) FROM battles", [], |row| row.get(0))
    }
}
