//! Clause accumulation and rendering.
//!
//! [`Clauses`] keeps one ordered fragment list per SQL clause. Fragments are opaque
//! caller text and are never inspected; rendering only decides which clauses appear
//! and how fragments are joined.

/// Kind of statement being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementKind {
    #[default]
    Uninitialized,
    Insert,
    Delete,
    Update,
    Select,
}

/// Text rendered for an explicit AND group break.
pub(crate) const AND_BREAK: &str = ") \n and (";
/// Text rendered for an explicit OR group break.
pub(crate) const OR_BREAK: &str = ") \n or (";

/// One entry of a clause list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    /// Closes the current predicate group and opens a new one joined by `and`.
    AndBreak,
    /// Closes the current predicate group and opens a new one joined by `or`.
    OrBreak,
}

impl Fragment {
    fn is_break(&self) -> bool {
        !matches!(self, Fragment::Text(_))
    }

    fn as_str(&self) -> &str {
        match self {
            Fragment::Text(text) => text,
            Fragment::AndBreak => AND_BREAK,
            Fragment::OrBreak => OR_BREAK,
        }
    }
}

/// Which predicate list a condition targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionTarget {
    Where,
    Having,
}

#[derive(Debug, Clone, Default)]
pub struct Clauses {
    pub(crate) kind: StatementKind,
    pub(crate) distinct: bool,
    pub(crate) select: Vec<Fragment>,
    pub(crate) tables: Vec<Fragment>,
    pub(crate) join: Vec<Fragment>,
    pub(crate) inner_join: Vec<Fragment>,
    pub(crate) outer_join: Vec<Fragment>,
    pub(crate) left_outer_join: Vec<Fragment>,
    pub(crate) right_outer_join: Vec<Fragment>,
    pub(crate) where_: Vec<Fragment>,
    pub(crate) having: Vec<Fragment>,
    pub(crate) group_by: Vec<Fragment>,
    pub(crate) order_by: Vec<Fragment>,
    pub(crate) limit: Vec<Fragment>,
    pub(crate) sets: Vec<Fragment>,
    pub(crate) columns: Vec<Fragment>,
    pub(crate) values: Vec<Fragment>,
}

pub(crate) fn push(list: &mut Vec<Fragment>, text: impl Into<String>) {
    list.push(Fragment::Text(text.into()));
}

impl Clauses {
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub(crate) fn conditions_mut(&mut self, target: ConditionTarget) -> &mut Vec<Fragment> {
        match target {
            ConditionTarget::Where => &mut self.where_,
            ConditionTarget::Having => &mut self.having,
        }
    }

    /// Render the accumulated clauses for the current statement kind.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self.kind {
            StatementKind::Uninitialized => {}
            StatementKind::Insert => {
                clause(&mut out, "INSERT INTO", &self.tables, "", "", ", ");
                clause(&mut out, "", &self.columns, "(", ")", ", ");
                clause(&mut out, "VALUES", &self.values, "(", ")", ", ");
            }
            StatementKind::Delete => {
                clause(&mut out, "DELETE FROM", &self.tables, "", "", ", ");
                clause(&mut out, "WHERE", &self.where_, "(", ")", " and ");
            }
            StatementKind::Update => {
                clause(&mut out, "UPDATE", &self.tables, "", "", ", ");
                clause(&mut out, "SET", &self.sets, "", "", ", ");
                clause(&mut out, "WHERE", &self.where_, "(", ")", " and ");
            }
            StatementKind::Select => {
                let select = if self.distinct {
                    "SELECT DISTINCT"
                } else {
                    "SELECT"
                };
                clause(&mut out, select, &self.select, "", "", ", ");
                clause(&mut out, "FROM", &self.tables, "", "", ", ");
                clause(&mut out, "JOIN", &self.join, "", "", "\nJOIN ");
                clause(&mut out, "INNER JOIN", &self.inner_join, "", "", "\nINNER JOIN ");
                clause(&mut out, "OUTER JOIN", &self.outer_join, "", "", "\nOUTER JOIN ");
                clause(
                    &mut out,
                    "LEFT OUTER JOIN",
                    &self.left_outer_join,
                    "",
                    "",
                    "\nLEFT OUTER JOIN ",
                );
                clause(
                    &mut out,
                    "RIGHT OUTER JOIN",
                    &self.right_outer_join,
                    "",
                    "",
                    "\nRIGHT OUTER JOIN ",
                );
                clause(&mut out, "WHERE", &self.where_, "(", ")", " and ");
                clause(&mut out, "GROUP BY", &self.group_by, "", "", ", ");
                clause(&mut out, "HAVING", &self.having, "(", ")", " and ");
                clause(&mut out, "ORDER BY", &self.order_by, "", "", ", ");
                clause(&mut out, "LIMIT", &self.limit, "", "", "");
            }
        }
        out
    }
}

/// Write one clause: `keyword open part conj part ... close`, on its own line.
///
/// No conjunction is written next to a group break, whose own text joins the groups.
/// Breaks without a predicate on both sides are not rendered.
fn clause(
    out: &mut String,
    keyword: &str,
    parts: &[Fragment],
    open: &str,
    close: &str,
    conj: &str,
) {
    let parts = effective_parts(parts);
    if parts.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(keyword);
    out.push(' ');
    out.push_str(open);
    let mut last: Option<&Fragment> = None;
    for part in parts {
        if let Some(prev) = last {
            if !part.is_break() && !prev.is_break() {
                out.push_str(conj);
            }
        }
        out.push_str(part.as_str());
        last = Some(part);
    }
    out.push_str(close);
}

fn effective_parts(parts: &[Fragment]) -> Vec<&Fragment> {
    let mut kept: Vec<&Fragment> = Vec::with_capacity(parts.len());
    for part in parts {
        if part.is_break() {
            match kept.last() {
                None => continue,
                Some(prev) if prev.is_break() => {
                    kept.pop();
                }
                Some(_) => {}
            }
        }
        kept.push(part);
    }
    while kept.last().is_some_and(|p| p.is_break()) {
        kept.pop();
    }
    kept
}
