use tabled::builder::Builder;
use tabled::settings::Style;

/// Rounded table with a header row and any number of string columns
pub struct TableBuilder {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableBuilder {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        let mut builder = Builder::default();
        builder.push_record(self.header.clone());
        for row in &self.rows {
            builder.push_record(row.clone());
        }
        builder.build().with(Style::rounded()).to_string()
    }
}

/// Two-column `Metric | Value` table
pub fn stats_table(stats: &[(&str, String)]) -> String {
    let mut builder = TableBuilder::new(["Metric", "Value"]);
    for (label, value) in stats {
        builder.add_row([label.to_string(), value.clone()]);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_renders_nothing() {
        let builder = TableBuilder::new(["id", "title"]);
        assert!(builder.is_empty());
        assert_eq!(builder.build(), "");
    }

    #[test]
    fn test_rows_are_rendered() {
        let mut builder = TableBuilder::new(["id", "title"]);
        builder.add_row(["1", "Algorithms 101"]);
        builder.add_row(["2", "Linear algebra"]);
        let table = builder.build();
        assert_eq!(builder.len(), 2);
        assert!(table.contains("title"));
        assert!(table.contains("Linear algebra"));
        assert!(table.starts_with('╭'));
    }

    #[test]
    fn test_stats_table() {
        let table = stats_table(&[("Tasks", "3".to_string())]);
        assert!(table.contains("Metric"));
        assert!(table.contains("Tasks"));
    }
}
