//! Projection of a kept entity onto the fixed output schema.
//!
//! Labels, descriptions and aliases share one rendering rule: each value
//! becomes `'V'@L`, and multiple values are joined with `|`.

use crate::config::ALIAS_SEPARATOR;
use crate::error::ImportError;
use crate::models::EntityRecord;

pub type ProjectedRow = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Id,
    Label,
    Type,
    Descriptions,
    Aliases,
    DocumentId,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Id,
        Column::Label,
        Column::Type,
        Column::Descriptions,
        Column::Aliases,
        Column::DocumentId,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Label => "label",
            Column::Type => "type",
            Column::Descriptions => "descriptions",
            Column::Aliases => "aliases",
            Column::DocumentId => "document_id",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Column::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Ordered column subset in effect for a run. Always contains `id` and `type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            columns: Column::ALL.to_vec(),
        }
    }
}

impl Schema {
    /// Parses a comma-separated column list. Columns are reordered into the
    /// canonical order regardless of how they were listed.
    pub fn parse(spec: &str) -> Result<Self, ImportError> {
        let mut columns = Vec::new();
        for name in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let column = Column::from_name(name)
                .ok_or_else(|| ImportError::Schema(format!("unknown column '{}'", name)))?;
            if columns.contains(&column) {
                return Err(ImportError::Schema(format!("duplicate column '{}'", name)));
            }
            columns.push(column);
        }

        for required in [Column::Id, Column::Type] {
            if !columns.contains(&required) {
                return Err(ImportError::Schema(format!(
                    "column '{}' is required",
                    required.name()
                )));
            }
        }

        columns.sort();
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::name).collect()
    }
}

/// Renders localized values as `'V'@lang`, joined by `|`. No values renders
/// as the empty string.
pub fn render_localized<'a>(values: impl IntoIterator<Item = &'a str>, lang: &str) -> String {
    let mut out = String::new();
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            out.push_str(ALIAS_SEPARATOR);
        }
        out.push('\'');
        out.push_str(value);
        out.push('\'');
        out.push('@');
        out.push_str(lang);
    }
    out
}

pub struct Projector {
    schema: Schema,
    lang: String,
    doc_id: String,
}

impl Projector {
    pub fn new(schema: Schema, lang: &str, doc_id: &str) -> Self {
        Self {
            schema,
            lang: lang.to_string(),
            doc_id: doc_id.to_string(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// One cell per schema column, in schema order.
    pub fn project(&self, record: &EntityRecord) -> ProjectedRow {
        let lang = self.lang.as_str();
        self.schema
            .columns()
            .iter()
            .map(|column| match column {
                Column::Id => record.id.clone(),
                Column::Label => render_localized(record.label(lang), lang),
                Column::Type => record.kind.as_str().to_string(),
                Column::Descriptions => render_localized(record.description(lang), lang),
                Column::Aliases => render_localized(record.aliases(lang), lang),
                Column::DocumentId => self.doc_id.clone(),
            })
            .collect()
    }
}
