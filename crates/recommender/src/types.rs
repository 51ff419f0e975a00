//! Request and result types for top-N recommendation.

use model_loader::{ItemId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One-column table of target users.
///
/// The column name must match the user column the model was trained with.
/// Ids are plain `i32`, so the column can never hold a null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTable {
    column: String,
    user_ids: Vec<UserId>,
}

impl UserTable {
    pub fn new(column: impl Into<String>, user_ids: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            column: column.into(),
            user_ids: user_ids.into_iter().collect(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }
}

impl fmt::Display for UserTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<String>> = self
            .user_ids
            .iter()
            .map(|id| vec![id.to_string()])
            .collect();
        f.write_str(&render_table(&[self.column.as_str()], &rows))
    }
}

/// A single recommended item and its predicted rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub rating: f32,
}

impl Recommendation {
    pub fn new(item_id: ItemId, rating: f32) -> Self {
        Self { item_id, rating }
    }
}

/// Top-N list for one user, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecommendations {
    pub user_id: UserId,
    pub recommendations: Vec<Recommendation>,
}

/// Bordered text view of recommendation rows, keyed by the user column
pub struct RecommendationTable<'a> {
    pub user_col: &'a str,
    pub column: &'a str,
    pub rows: &'a [UserRecommendations],
}

impl fmt::Display for RecommendationTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                let entries: Vec<String> = row
                    .recommendations
                    .iter()
                    .map(|r| format!("{{{}, {}}}", r.item_id, r.rating))
                    .collect();
                vec![row.user_id.to_string(), format!("[{}]", entries.join(", "))]
            })
            .collect();
        f.write_str(&render_table(&[self.user_col, self.column], &rows))
    }
}

/// Render rows as a `+---+` bordered table with right-aligned cells
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = widths.iter().fold(String::from("+"), |mut acc, w| {
        acc.push_str(&"-".repeat(*w));
        acc.push('+');
        acc
    });

    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(border.clone());
    out.push(render_line(&widths, headers.iter().copied()));
    out.push(border.clone());
    for row in rows {
        out.push(render_line(&widths, row.iter().map(String::as_str)));
    }
    out.push(border);
    out.join("\n")
}

fn render_line<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    widths.iter().zip(cells).fold(String::from("|"), |mut acc, (w, cell)| {
        acc.push_str(&format!("{cell:>w$}|", w = *w));
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_table_display() {
        let table = UserTable::new("userIdInt", [1698346, 42]);
        let expected = "\
+---------+
|userIdInt|
+---------+
|  1698346|
|       42|
+---------+";
        assert_eq!(table.to_string(), expected);
    }

    #[test]
    fn test_recommendation_table_display() {
        let rows = vec![UserRecommendations {
            user_id: 7,
            recommendations: vec![Recommendation::new(3, 4.5), Recommendation::new(9, 2.0)],
        }];
        let rendered = RecommendationTable {
            user_col: "user",
            column: "recommendations",
            rows: &rows,
        }
        .to_string();

        assert!(rendered.contains("|user|"));
        assert!(rendered.contains("[{3, 4.5}, {9, 2}]"));
        assert_eq!(rendered.lines().count(), 5);
    }
}
