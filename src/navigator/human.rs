//! Human-behavior simulation
//!
//! A handful of randomized pointer movements and scroll gestures after
//! each navigation; a page that renders and is immediately scraped with
//! zero input events is an automation tell.

use anyhow::Result;
use chromiumoxide::Page;
use chromiumoxide::layout::Point;
use rand::Rng;
use std::time::Duration;

/// Move the pointer through a few random positions
pub async fn simulate_pointer(page: &Page) -> Result<()> {
    let moves = {
        let mut rng = rand::rng();
        rng.random_range(2..=5)
    };
    for _ in 0..moves {
        // Draw coordinates and pause before awaiting; the thread-local
        // RNG cannot be held across an await point
        let (x, y, pause_ms) = {
            let mut rng = rand::rng();
            (
                f64::from(rng.random_range(100..800)),
                f64::from(rng.random_range(100..600)),
                rng.random_range(100..300u64),
            )
        };
        page.move_mouse(Point { x, y }).await?;
        tokio::time::sleep(Duration::from_millis(pause_ms)).await;
    }
    Ok(())
}

/// Scroll down the page in random steps, occasionally scrolling back up
pub async fn random_scrolling(page: &Page) -> Result<()> {
    let scrolls = {
        let mut rng = rand::rng();
        rng.random_range(2..=5)
    };
    for _ in 0..scrolls {
        let (amount, pause_ms) = {
            let mut rng = rand::rng();
            (rng.random_range(100..800), rng.random_range(300..1000u64))
        };
        page.evaluate(format!("window.scrollBy(0, {amount})")).await?;
        tokio::time::sleep(Duration::from_millis(pause_ms)).await;
    }

    let (back, amount, pause_ms) = {
        let mut rng = rand::rng();
        (
            rng.random::<f64>() > 0.7,
            rng.random_range(100..400),
            rng.random_range(300..700u64),
        )
    };
    if back {
        page.evaluate(format!("window.scrollBy(0, -{amount})")).await?;
        tokio::time::sleep(Duration::from_millis(pause_ms)).await;
    }
    Ok(())
}
