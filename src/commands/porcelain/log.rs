use crate::areas::repository::Repository;
use crate::artifacts::log::rev_list::HistoryEntry;
use colored::Colorize;

#[derive(Debug, Clone, Copy)]
pub struct LogOptions {
    pub max_count: usize,
    pub oneline: bool,
}

impl Repository {
    pub fn log(&self, opts: &LogOptions) -> anyhow::Result<()> {
        let history = self
            .graph()
            .history(self.project(), self.branch_name(), opts.max_count)?;
        let head = history.first().map(|entry| entry.oid.clone());

        for entry in &history {
            let decoration = if Some(&entry.oid) == head.as_ref() {
                format!(" ({})", self.branch_name()).yellow().to_string()
            } else {
                String::new()
            };

            if opts.oneline {
                writeln!(
                    self.writer(),
                    "{}{} {}",
                    entry.oid.to_short_oid().yellow(),
                    decoration,
                    entry.commit.short_message()
                )?;
            } else {
                self.show_commit_medium(entry, &decoration)?;
            }
        }

        Ok(())
    }

    fn show_commit_medium(&self, entry: &HistoryEntry, decoration: &str) -> anyhow::Result<()> {
        let commit = &entry.commit;

        writeln!(self.writer(), "{}{}", format!("commit {}", entry.oid).yellow(), decoration)?;
        if commit.is_merge() {
            let parents = commit
                .parents()
                .iter()
                .map(|parent| parent.to_short_oid())
                .collect::<Vec<_>>();
            writeln!(self.writer(), "Merge:  {}", parents.join(" "))?;
        }
        writeln!(self.writer(), "Author: {}", commit.author())?;
        writeln!(self.writer(), "Date:   {}", commit.readable_timestamp())?;
        writeln!(self.writer())?;
        for message_line in commit.message().lines() {
            writeln!(self.writer(), "    {}", message_line)?;
        }
        writeln!(self.writer())?;

        Ok(())
    }
}
