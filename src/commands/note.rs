use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use dietdiary::models::EntryPatch;
use dietdiary::note::NoteCommitter;
use dietdiary::store::DiaryStore;

use super::parse_date;

#[derive(Args)]
pub struct NoteArgs {
    /// Date (YYYY-MM-DD), defaults to today
    #[arg(long, short)]
    date: Option<String>,

    /// New note text. Without it, each line read from stdin replaces the
    /// note and is saved after a pause in typing.
    text: Option<String>,
}

impl NoteArgs {
    pub async fn run(
        &self,
        store: Arc<dyn DiaryStore>,
        quiet_period: Duration,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let date = parse_date(self.date.as_deref())?;

        if let Some(text) = &self.text {
            let entry = store.update(date, EntryPatch::note(text.as_str())).await?;
            println!("Note for {}: {}", date, entry.note);
            return Ok(());
        }

        let loaded = store.read(date).await?.entry.note;
        let committer = NoteCommitter::new(store, quiet_period);
        committer.select_date(date);
        committer.settle_initial(&loaded);

        eprintln!("Editing note for {} (Ctrl-D to finish)", date);
        if !loaded.is_empty() {
            eprintln!("Current: {}", loaded);
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            committer.on_change(line);
            if let Some(e) = committer.take_error() {
                eprintln!("Note not saved: {}", e);
            }
        }
        committer.flush().await;

        if let Some(e) = committer.take_error() {
            return Err(format!("Note not saved: {}", e).into());
        }
        println!(
            "Note for {}: {}",
            date,
            committer.text().unwrap_or_default()
        );
        Ok(())
    }
}
