use crate::error::FileError;
use crate::json_file;
use crate::sql::statement::InsertStatement;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Writes statements to any output, one per line
pub struct ScriptWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> ScriptWriter<W> {
    pub fn new(writer: W) -> Self {
        ScriptWriter { writer, written: 0 }
    }

    pub fn write_statements(&mut self, statements: &[InsertStatement]) -> Result<()> {
        for statement in statements {
            writeln!(self.writer, "{}", statement).context("Failed to write statement")?;
            self.written += 1;
        }
        Ok(())
    }

    /// Number of statements written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }
}

/// Render statements into the script text
pub fn render_script(statements: &[InsertStatement]) -> String {
    let mut script = String::new();
    for statement in statements {
        script.push_str(&statement.to_string());
        script.push('\n');
    }
    script
}

/// Replace the script at `path` in one step; a failure keeps the old script
pub fn write_script(path: &Path, statements: &[InsertStatement]) -> Result<(), FileError> {
    json_file::write_atomic(path, render_script(statements).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(table: &str, uuid: &str) -> InsertStatement {
        let mut statement = InsertStatement::new(table);
        statement.push("uuid".to_string(), format!("'{}'", uuid));
        statement
    }

    #[test]
    fn test_script_writer() {
        let mut buffer = Vec::new();
        let mut writer = ScriptWriter::new(&mut buffer);

        writer
            .write_statements(&[statement("actors", "a1"), statement("actors", "a2")])
            .unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "INSERT INTO actors (uuid) VALUES ('a1');\nINSERT INTO actors (uuid) VALUES ('a2');\n"
        );
    }

    #[test]
    fn test_render_matches_writer() {
        let statements = vec![statement("games", "g1"), statement("games_trailers", "t1")];

        let mut buffer = Vec::new();
        ScriptWriter::new(&mut buffer).write_statements(&statements).unwrap();

        assert_eq!(render_script(&statements), String::from_utf8(buffer).unwrap());
        assert_eq!(render_script(&[]), "");
    }
}
