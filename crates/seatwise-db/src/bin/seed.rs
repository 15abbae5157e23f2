//! # Seed Data Generator
//!
//! Creates a demo restaurant for local development.
//!
//! ## Usage
//! ```bash
//! # Seed ./seatwise_dev.db
//! cargo run -p seatwise-db --bin seed
//!
//! # Specify database path and timezone
//! cargo run -p seatwise-db --bin seed -- --db ./data/seatwise.db --tz Europe/Berlin
//! ```
//!
//! ## Generated Data
//! - One restaurant with default booking settings
//! - Open 17:00-22:00, closed Mondays
//! - Seven tables: 2, 2, 4, 4, 6, 8, 10 seats across two sections

use chrono::Utc;
use seatwise_core::{OperatingHours, Restaurant, RestaurantSettings, Table, TableShape};
use seatwise_db::{Database, DbConfig};
use std::env;
use uuid::Uuid;

/// (table number, capacity, section, shape)
const TABLES: &[(&str, i32, &str, TableShape)] = &[
    ("1", 2, "window", TableShape::Round),
    ("2", 2, "window", TableShape::Round),
    ("3", 4, "main", TableShape::Square),
    ("4", 4, "main", TableShape::Square),
    ("5", 6, "main", TableShape::Rectangle),
    ("6", 8, "main", TableShape::Rectangle),
    ("7", 10, "private", TableShape::Rectangle),
];

const OPEN_MINUTE: i32 = 17 * 60;
const CLOSE_MINUTE: i32 = 22 * 60;

/// Monday in the 0 = Sunday numbering.
const CLOSED_DAY: i32 = 1;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./seatwise_dev.db");
    let mut timezone = String::from("UTC");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--tz" | "-t" => {
                if i + 1 < args.len() {
                    timezone = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Seatwise Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./seatwise_dev.db)");
                println!("  -t, --tz <NAME>    IANA timezone of the restaurant (default: UTC)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    if timezone.parse::<chrono_tz::Tz>().is_err() {
        eprintln!("Unknown timezone '{}', falling back to UTC", timezone);
        timezone = String::from("UTC");
    }

    println!("🌱 Seatwise Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Timezone: {}", timezone);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.restaurants().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} restaurant(s)", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let restaurant = Restaurant {
        id: Uuid::new_v4().to_string(),
        name: "Demo Bistro".to_string(),
        timezone,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.restaurants().insert(&restaurant).await?;
    db.restaurants()
        .upsert_settings(&RestaurantSettings::defaults_for(&restaurant.id))
        .await?;

    let hours: Vec<OperatingHours> = (0..7)
        .map(|day_of_week| OperatingHours {
            restaurant_id: restaurant.id.clone(),
            day_of_week,
            open_time: OPEN_MINUTE,
            close_time: CLOSE_MINUTE,
            is_open: day_of_week != CLOSED_DAY,
        })
        .collect();
    db.restaurants()
        .replace_operating_hours(&restaurant.id, &hours)
        .await?;

    println!("✓ Restaurant {} ({})", restaurant.name, restaurant.id);

    for (idx, (number, capacity, section, shape)) in TABLES.iter().enumerate() {
        let table = Table {
            id: Uuid::new_v4().to_string(),
            restaurant_id: restaurant.id.clone(),
            table_number: number.to_string(),
            capacity: *capacity,
            section: Some(section.to_string()),
            shape: *shape,
            pos_x: (idx % 4) as f64 * 2.0,
            pos_y: (idx / 4) as f64 * 2.0,
            width: 1.0,
            height: if *capacity > 4 { 2.0 } else { 1.0 },
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.tables().insert(&table).await {
            eprintln!("Failed to insert table {}: {}", table.table_number, e);
            continue;
        }
        println!("  Table {:>2}: {:>2} seats ({})", number, capacity, section);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
