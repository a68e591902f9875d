#![warn(clippy::all)]

use anyhow::Context;
use cookbook::config::{DatabaseConfig, DATABASE_URL_VAR, SETTINGS_FILE};
use cookbook::{Dish, Session};
use tracing::level_filters::LevelFilter;
use tracing::{event, trace_span, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::Registry;

fn main() -> anyhow::Result<()> {
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::ACTIVE)
        .pretty();
    let subscriber = Registry::default()
        .with(stderr_log)
        .with(LevelFilter::from_level(Level::INFO));

    tracing::subscriber::set_global_default(subscriber).context("Unable to set global subscriber")?;

    start()
}

fn stars(dish: &Dish) -> String {
    dish.stars
        .map_or_else(|| "none".to_owned(), |stars| stars.to_string())
}

fn start() -> anyhow::Result<()> {
    let span = trace_span!("starting main");
    let _guard = span.enter();

    // DATABASE_URL, from the environment or a .env file, replaces DefaultConnection
    let override_url = dotenvy::var(DATABASE_URL_VAR).ok();
    let config = DatabaseConfig::resolve(SETTINGS_FILE, override_url)
        .context("Failed to load database settings")?;

    event!(Level::TRACE, "opening session");
    let mut session = Session::connect(&config).context("Failed to open database session")?;

    println!("Add porridge for breakfast");
    let porridge = session.add(
        Dish::new("Breakfast porridge")
            .with_notes("This is so good")
            .with_stars(4),
    );

    // Add
    session.save()?;
    let id = session
        .dish(porridge)
        .and_then(|dish| dish.id)
        .context("porridge has no id after save")?;
    println!("Add porridge successfully: {id}");

    // Read
    let dishes = session.query("porridge")?;
    if dishes.len() != 1 {
        eprintln!("Something really bad happened. Porridge disappeared :-(");
    }
    dishes.iter().for_each(|dish| println!("{}", dish.title));

    // Update
    let dish = session
        .dish_mut(porridge)
        .context("porridge is no longer tracked")?;
    println!("number of star before update {}", stars(dish));
    dish.stars = Some(5);
    session.save()?;
    let dish = session
        .dish(porridge)
        .context("porridge is no longer tracked")?;
    println!("number of star: {}", stars(dish));

    // Delete
    println!("Removing porridge from database");
    session.remove(porridge);
    session.save()?;
    println!("porridge removed");

    Ok(())
}
