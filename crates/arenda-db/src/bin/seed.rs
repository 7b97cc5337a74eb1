//! # Seed Data Generator
//!
//! Populates the database with rental categories and products for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p arenda-db --bin seed
//!
//! # Specify database path
//! cargo run -p arenda-db --bin seed -- --db ./data/arenda.db
//! ```
//!
//! Each product gets a realistic rental price (in cents), a stock
//! level, and material/color attributes where they make sense.

use std::env;

use tracing_subscriber::EnvFilter;

use arenda_db::{Database, DbConfig, NewCategory, NewProduct};

/// (category, description, products)
/// Product tuple: (name, price_cents, quantity, material, color)
#[allow(clippy::type_complexity)]
const CATALOG: &[(
    &str,
    &str,
    &[(&str, i64, i64, Option<&str>, Option<&str>)],
)] = &[
    (
        "Chairs",
        "Event seating for halls and open air",
        &[
            ("Folding Chair", 2_500, 200, Some("steel"), Some("black")),
            ("Chiavari Chair", 4_500, 120, Some("beech"), Some("gold")),
            ("Bar Stool", 3_500, 40, Some("steel"), Some("chrome")),
            ("Kids Chair", 1_500, 60, Some("plastic"), Some("blue")),
            ("Lounge Armchair", 12_000, 16, Some("velvet"), Some("emerald")),
        ],
    ),
    (
        "Tables",
        "Banquet, cocktail and buffet tables",
        &[
            ("Round Table 180cm", 10_000, 40, Some("plywood"), None),
            ("Rectangular Table", 8_000, 50, Some("plywood"), None),
            ("Cocktail Table", 6_000, 30, Some("steel"), Some("white")),
            ("Buffet Counter", 15_000, 8, Some("mdf"), Some("white")),
        ],
    ),
    (
        "Tents",
        "Marquees and pavilions with assembly",
        &[
            ("Pavilion 3x3", 45_000, 12, Some("polyester"), Some("white")),
            ("Marquee 6x12", 280_000, 3, Some("pvc"), Some("white")),
            ("Umbrella 3m", 18_000, 20, Some("polyester"), Some("beige")),
        ],
    ),
    (
        "Sound & Light",
        "PA systems, microphones and stage light",
        &[
            ("Active Speaker 1000W", 30_000, 10, None, None),
            ("Wireless Microphone", 8_000, 24, None, None),
            ("Mixing Console 12ch", 25_000, 6, None, None),
            ("LED Par Spotlight", 5_000, 40, None, None),
            ("Disco Ball", 4_000, 8, None, Some("silver")),
        ],
    ),
    (
        "Decor",
        "Backdrops, arches and textile",
        &[
            ("Wedding Arch", 35_000, 5, Some("metal"), Some("white")),
            ("Backdrop Frame", 20_000, 10, Some("aluminium"), None),
            ("Tablecloth Round", 1_200, 150, Some("cotton"), Some("white")),
            ("Chair Cover", 800, 250, Some("spandex"), Some("white")),
            ("Carpet Runner 10m", 9_000, 12, Some("polyamide"), Some("red")),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./arenda_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("arenda Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./arenda_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Seeding rental catalog into {db_path}");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let catalog = db.catalog();

    let mut product_count = 0usize;

    for (category_name, description, products) in CATALOG {
        let category = catalog
            .create_category(&NewCategory {
                name: category_name.to_string(),
                description: Some(description.to_string()),
                image_url: None,
            })
            .await?;

        for (name, price_cents, quantity, material, color) in *products {
            catalog
                .create_product(&NewProduct {
                    category_id: category.id.clone(),
                    name: name.to_string(),
                    description: None,
                    price_cents: *price_cents,
                    quantity: *quantity,
                    material: material.map(str::to_string),
                    color: color.map(str::to_string),
                    image_url: None,
                })
                .await?;
            product_count += 1;
        }

        println!("  {category_name}: {} products", products.len());
    }

    println!(
        "Done: {} categories, {product_count} products",
        CATALOG.len()
    );

    db.close().await;
    Ok(())
}
