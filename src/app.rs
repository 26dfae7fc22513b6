use crate::cli::{Prompt, PromptCommand};
use crate::config::Config;
use crate::error::ImportError;
use crate::feed::{EventView, SourceId};
use crate::gateway::{DashboardClient, GraphClient};
use crate::importer::Importer;
use crate::session::Session;
use anyhow::{Context, Result};
use chrono::DateTime;
use rustyline::DefaultEditor;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

pub struct Application {
    importer: Importer,
    source: SourceId,
    preview_chars: usize,
}

impl Application {
    pub fn new(importer: Importer, source: SourceId, preview_chars: usize) -> Self {
        Self {
            importer,
            source,
            preview_chars,
        }
    }

    /// Wires real HTTP gateways from the config.
    pub fn from_config(config: &Config, page: Option<String>) -> Result<Self> {
        let source = page
            .or_else(|| config.import.default_page.clone())
            .context("No Facebook page configured: pass --page or set FB_PAGE_ID")?;

        let timeout = Duration::from_secs(config.http.request_timeout_secs);
        let graph_http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build graph HTTP client")?;
        let dashboard_http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .context("Failed to build dashboard HTTP client")?;

        if config.graph.access_token.is_none() {
            log::warn!("No graph access token configured; graph calls will likely be rejected");
        }
        let token = config.graph.access_token.clone().map(SecretString::from);
        let graph = GraphClient::new(
            graph_http,
            &config.graph.base_url,
            &config.graph.version,
            token,
        );
        let dashboard = DashboardClient::new(dashboard_http, &config.dashboard.base_url);

        let session = Session::new(config.dashboard.csrf_token.clone());
        let importer = Importer::new(session, Arc::new(graph), Arc::new(dashboard));
        Ok(Self::new(importer, source, config.import.description_preview_chars))
    }

    pub async fn run(&self) -> Result<()> {
        log::info!("Starting fbimport for page {}", self.source);

        if let Err(e) = self.importer.load_categories().await {
            println!("⚠️  Could not load categories: {}", e.user_message());
        }
        match self
            .importer
            .load_import_events_first_time(&self.source)
            .await
        {
            Ok(_) => self.print_events(),
            Err(e) => report(&e),
        }

        let mut rl = DefaultEditor::new()?;
        println!("Type 'help' for commands.");

        loop {
            match rl.readline("fbimport> ") {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    match self.process_input(&line).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(err) => log::error!("Failed to process command: {:?}", err),
                    }
                }
                Err(rustyline::error::ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(rustyline::error::ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }
        Ok(())
    }

    /// Runs one prompt line. Returns `false` when the prompt should close.
    pub async fn process_input(&self, line: &str) -> Result<bool> {
        let prompt = match Prompt::parse_line(line) {
            Ok(Some(prompt)) => prompt,
            Ok(None) => return Ok(true),
            Err(e) => {
                e.print()?;
                return Ok(true);
            }
        };

        let source = self.source.as_str();
        let importer = &self.importer;
        let result = match prompt.command {
            PromptCommand::Load => importer
                .load_import_events_first_time(source)
                .await
                .map(|_| ()),
            PromptCommand::More => {
                if importer.session().feed(source).can_load_more() {
                    importer.load_import_events(source).await.map(|_| ())
                } else {
                    println!("No more posts to scan.");
                    Ok(())
                }
            }
            PromptCommand::List => Ok(()),
            PromptCommand::Import { fbid } => importer.import_event(source, &fbid).await,
            PromptCommand::Delete { fbid } => {
                importer.delete_imported_event(source, &fbid).await
            }
            PromptCommand::Resync { fbid } => {
                importer.resync_imported_event(source, &fbid).await
            }
            PromptCommand::Tag { fbid, category } => {
                importer.add_category_to_event(source, &fbid, category).await
            }
            PromptCommand::Untag { fbid, category } => {
                importer.remove_category_from_event(source, &fbid, category).await
            }
            PromptCommand::Categories => {
                match importer.load_categories().await {
                    Ok(_) => self.print_categories(),
                    Err(e) => report(&e),
                }
                return Ok(true);
            }
            PromptCommand::ShowImported => {
                importer.show_already_imported(source);
                Ok(())
            }
            PromptCommand::HideImported => {
                importer.hide_already_imported(source);
                Ok(())
            }
            PromptCommand::Expand { fbid } => {
                importer.show_full_description(source, &fbid);
                Ok(())
            }
            PromptCommand::Collapse { fbid } => {
                importer.show_less_description(source, &fbid);
                Ok(())
            }
            PromptCommand::Exit => return Ok(false),
        };

        match result {
            Ok(()) => self.print_events(),
            Err(e) => report(&e),
        }
        Ok(true)
    }

    fn print_events(&self) {
        let session = self.importer.session();
        let feed = session.feed(&self.source);
        let events = session.visible_events(&self.source);

        if events.is_empty() {
            println!("No events to show.");
        }
        for (i, event) in events.iter().enumerate() {
            println!("{}. {}", i + 1, render_event(event, self.preview_chars));
        }

        let hidden = session.already_imported_count(&self.source);
        let filter = if feed.show_already_imported {
            "shown"
        } else {
            "hidden"
        };
        println!("\n{} already imported ({}).", hidden, filter);
        if feed.can_load_more() {
            println!("Type 'more' to scan older posts.");
        }
    }

    fn print_categories(&self) {
        let session = self.importer.session();
        let store = session.store();
        for id in session.known_categories() {
            let description = store
                .category(id)
                .and_then(|c| c.description.as_deref())
                .unwrap_or("");
            println!("  {:>4}  {}", id, description);
        }
    }
}

fn report(err: &ImportError) {
    if err.is_precondition() {
        println!("⚠️  {}", err.user_message());
    } else {
        println!("❌ {}", err.user_message());
    }
}

fn format_time(raw: &str) -> String {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|t| t.format("%a %d %b %Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// One listing entry: header line, then indented details.
pub fn render_event(event: &EventView, preview_chars: usize) -> String {
    let details = &event.details;
    let marker = if event.imported { "★" } else { "☆" };
    let mut output = format!(
        "{} {} [{}]",
        marker,
        details.name.as_deref().unwrap_or("(untitled)"),
        event.fbid
    );

    if let Some(start) = &details.start_time {
        output.push_str(&format!(" - {}", format_time(start)));
    }

    let busy = [
        (event.ui.importing, "importing"),
        (event.ui.deleting, "deleting"),
        (event.ui.saving, "saving"),
        (event.ui.saving_categories, "saving categories"),
    ];
    for (flag, label) in busy {
        if flag {
            output.push_str(&format!(" ({label}...)"));
        }
    }

    if let Some(place) = &details.place_name {
        output.push_str(&format!("\n   Place: {}", place));
        if let Some(city) = &details.location.city {
            output.push_str(&format!(", {}", city));
        }
    }

    if let Some(description) = &details.description {
        let collapsed =
            !event.ui.show_full_description && event.has_long_description(preview_chars);
        let desc = if collapsed {
            let preview: String = description.chars().take(preview_chars).collect();
            format!("{}... (expand {})", preview, event.fbid)
        } else {
            description.clone()
        };
        output.push_str(&format!("\n   Description: {}", desc));
    }

    if !event.categories.is_empty() {
        let tags: Vec<String> = event
            .categories
            .iter()
            .map(|c| {
                let check = if c.imported { "x" } else { " " };
                format!(
                    "[{}] {} {}",
                    check,
                    c.id,
                    c.description.as_deref().unwrap_or("")
                )
            })
            .collect();
        output.push_str(&format!("\n   Categories: {}", tags.join("  ")));
    }

    if let Some(error) = &event.ui.error {
        output.push_str(&format!("\n   Last error: {}", error));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{CategoryView, EventUi};
    use crate::models::EventDetails;

    fn view(description: &str) -> EventView {
        EventView {
            fbid: "42".to_string(),
            imported_id: None,
            imported: false,
            details: EventDetails {
                name: Some("Gig".to_string()),
                description: Some(description.to_string()),
                start_time: Some("2017-03-04T21:00:00+0100".to_string()),
                ..Default::default()
            },
            categories: vec![CategoryView {
                id: 1,
                description: Some("Music".to_string()),
                imported: true,
            }],
            ui: EventUi::default(),
        }
    }

    #[test]
    fn test_render_truncates_long_descriptions() {
        let rendered = render_event(&view("abcdefghij"), 4);
        assert!(rendered.contains("Description: abcd... (expand 42)"));
        assert!(rendered.contains("Sat 04 Mar 2017 21:00"));
        assert!(rendered.contains("[x] 1 Music"));
    }

    #[test]
    fn test_render_full_description_when_expanded() {
        let mut event = view("abcdefghij");
        event.ui.show_full_description = true;
        let rendered = render_event(&event, 4);
        assert!(rendered.contains("Description: abcdefghij"));
    }

    #[test]
    fn test_unparseable_time_is_shown_raw() {
        assert_eq!(format_time("sometime"), "sometime");
    }
}
