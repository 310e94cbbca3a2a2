use crate::areas::repository::Repository;
use crate::artifacts::analyzer::asset_type::AssetFormat;
use crate::artifacts::analyzer::dependency_graph::DependencyGraph;
use crate::artifacts::analyzer::{AssetAnalysis, analyze_or_scan};
use anyhow::Context;
use colored::Colorize;
use std::path::PathBuf;

impl Repository {
    /// Analyze the given files, or every recognised asset in the working copy.
    pub fn analyze(&mut self, files: &[String], json: bool) -> anyhow::Result<()> {
        let paths = if files.is_empty() {
            self.workspace()
                .list_files(None)?
                .into_iter()
                .filter(|path| AssetFormat::from_path(path).is_recognized())
                .collect::<Vec<_>>()
        } else {
            files
                .iter()
                .map(|file| self.workspace().relativize(file.as_ref()))
                .collect::<anyhow::Result<Vec<PathBuf>>>()?
        };

        let mut analyses = Vec::with_capacity(paths.len());
        for path in &paths {
            let content = self
                .workspace()
                .read_file(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            analyses.push(analyze_or_scan(path, &content));
        }

        let graph = DependencyGraph::build(analyses.iter().map(|analysis| analysis.info.clone()));

        if json {
            let infos = graph.assets().collect::<Vec<_>>();
            writeln!(self.writer(), "{}", serde_json::to_string_pretty(&infos)?)?;
            return Ok(());
        }

        for analysis in &analyses {
            self.print_analysis(analysis, &graph)?;
        }
        for cycle in graph.cycles() {
            writeln!(self.writer(), "{} {}", "cycle:".red(), cycle.join(" -> "))?;
        }

        Ok(())
    }

    fn print_analysis(&self, analysis: &AssetAnalysis, graph: &DependencyGraph) -> anyhow::Result<()> {
        let info = graph.asset(&analysis.info.path).unwrap_or(&analysis.info);
        let criticality = self.integrity().policy().criticality(info);

        writeln!(self.writer(), "{}", info.path.bold())?;
        match info.blueprint_subtype {
            Some(subtype) => writeln!(self.writer(), "  type:        {} ({})", info.asset_type, subtype)?,
            None => writeln!(self.writer(), "  type:        {}", info.asset_type)?,
        }
        writeln!(self.writer(), "  complexity:  {:.1}", info.complexity_score)?;
        writeln!(self.writer(), "  criticality: {}", criticality)?;
        if let Some(error) = &analysis.error {
            writeln!(self.writer(), "  {} {}", "header:".yellow(), error)?;
        }

        for dependency in &info.dependencies {
            let marker = if dependency.circular { " (circular)" } else { "" };
            writeln!(
                self.writer(),
                "  {:<10} {}{}",
                dependency.kind.as_str(),
                dependency.target,
                marker
            )?;
        }

        Ok(())
    }
}
