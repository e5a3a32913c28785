//! Memory CLI commands: store, search, delete-all, dedup, stats, tool.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use longmem_types::memory::MemoryData;

use crate::state::AppState;

/// ```bash
/// lmem store "I live in Paris" --importance 0.9 --category personal_info --topic location
/// ```
pub async fn store(
    state: &AppState,
    content: &str,
    importance: f32,
    category: &str,
    topics: Vec<String>,
    json: bool,
) -> Result<()> {
    let id = state
        .memory_service
        .add(&state.user_key, content, importance, category, topics)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"id": id, "user": state.user_key, "stored": true})
        );
    } else {
        println!(
            "  {} Memory {} stored for '{}'",
            style("*").green().bold(),
            style(id).bold(),
            style(&state.user_key).cyan()
        );
        println!("  {}", style(content).dim());
    }

    Ok(())
}

/// ```bash
/// lmem search "where does the user live?" --top-k 3
/// ```
pub async fn search(state: &AppState, query: &str, top_k: Option<usize>, json: bool) -> Result<()> {
    let top_k = state.top_k(top_k);
    let results = state
        .memory_service
        .search(&state.user_key, query, top_k)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!();
        println!(
            "  {} No memories found for '{}'.",
            style("i").blue().bold(),
            style(&state.user_key).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("{}", results_table(&results));
    println!();
    Ok(())
}

/// Delete everything after confirmation (skipped with `--force` or `--json`).
///
/// The delete always reaches the store, even when the collection reads as
/// empty: an unreadable snapshot counts as zero memories but still exists.
pub async fn delete_all(state: &AppState, force: bool, json: bool) -> Result<()> {
    let count = state.memory_service.stats(&state.user_key).await.count;

    if needs_confirmation(count, force, json) {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Wipe all {} memories for '{}'? This cannot be undone.",
                style(count).bold(),
                style(&state.user_key).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.memory_service.delete_all(&state.user_key).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": count, "user": state.user_key})
        );
    } else {
        println!(
            "  {} Wiped {} for '{}'.",
            style("x").red().bold(),
            plural(count),
            state.user_key
        );
    }

    Ok(())
}

pub async fn dedup(state: &AppState, json: bool) -> Result<()> {
    let report = state.memory_service.deduplicate(&state.user_key).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "user": state.user_key,
                "examined": report.examined,
                "removed": report.removed,
            })
        );
    } else {
        println!(
            "  {} Examined {}, removed {} duplicate{}.",
            style("*").green().bold(),
            plural(report.examined),
            style(report.removed).bold(),
            if report.removed == 1 { "" } else { "s" }
        );
    }

    Ok(())
}

pub async fn stats(state: &AppState, json: bool) -> Result<()> {
    let stats = state.memory_service.stats(&state.user_key).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let last_dedup = stats
        .last_deduplicated_at
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!();
    println!("  Memories for '{}'", style(&state.user_key).cyan().bold());
    println!();
    println!("  {:<16} {}", style("Count").dim(), style(stats.count).bold());
    println!(
        "  {:<16} {}",
        style("Updated").dim(),
        stats.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("  {:<16} {}", style("Last dedup").dim(), last_dedup);
    println!(
        "  {:<16} {}",
        style("Dedup due").dim(),
        if stats.dedup_due {
            style("yes").yellow()
        } else {
            style("no").green()
        }
    );
    println!(
        "  {:<16} {}",
        style("Model").dim(),
        stats.embedding_model.as_deref().unwrap_or("-")
    );
    println!(
        "  {:<16} {:?} ({})",
        style("Storage").dim(),
        state.config.storage.backend,
        state.data_dir.display()
    );
    println!();

    Ok(())
}

/// Run an agent tool exactly as an agent would and print its text result.
pub async fn tool(state: &AppState, name: &str, arguments: &str, json: bool) -> Result<()> {
    let output = state.tools.execute(name, &state.user_key, arguments).await?;

    if json {
        println!("{}", serde_json::json!({"tool": name, "output": output}));
    } else {
        println!("{output}");
    }
    Ok(())
}

// --- Formatting helpers ---

fn results_table(results: &[MemoryData]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Content").fg(Color::White),
        Cell::new("Category").fg(Color::White),
        Cell::new("Topics").fg(Color::White),
        Cell::new("Importance").fg(Color::White),
    ]);

    for (rank, memory) in results.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1).fg(Color::DarkGrey),
            Cell::new(truncate(&memory.content, 60)).fg(Color::White),
            Cell::new(&memory.category).fg(Color::Cyan),
            Cell::new(memory.topics.join(", ")).fg(Color::DarkGrey),
            Cell::new(format!("{:.2}", memory.importance)).fg(Color::Yellow),
        ]);
    }
    table
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn needs_confirmation(count: usize, force: bool, json: bool) -> bool {
    count > 0 && !force && !json
}

fn plural(count: usize) -> String {
    format!("{count} memor{}", if count == 1 { "y" } else { "ies" })
}
