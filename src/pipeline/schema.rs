use serde::Serialize;

/// How a column's raw token is coerced when a row is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
}

/// One column declaration of a [`RecordSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: true }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false }
    }
}

/// Ordered, immutable declaration of the columns expected by one import use case.
///
/// Column names are lower-case; the parser lower-cases header tokens before
/// matching them against the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSchema {
    name: &'static str,
    fields: Vec<FieldSpec>,
}

impl RecordSchema {
    pub fn new(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { name, fields }
    }

    /// Daily behavior check-ins recorded by a teacher.
    pub fn behavior_checkin() -> Self {
        Self::new(
            "behavior_checkin",
            vec![
                FieldSpec::required("student_id", FieldKind::Text),
                FieldSpec::required("check_date", FieldKind::Text),
                FieldSpec::optional("attendance", FieldKind::Boolean),
                FieldSpec::required("discipline_score", FieldKind::Integer),
                FieldSpec::optional("teacher_note", FieldKind::Text),
            ],
        )
    }

    /// Students to provision accounts for.
    pub fn student_roster() -> Self {
        Self::new(
            "student_roster",
            vec![
                FieldSpec::required("student_id", FieldKind::Text),
                FieldSpec::required("full_name", FieldKind::Text),
                FieldSpec::required("class_id", FieldKind::Text),
            ],
        )
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Coercion kind for a header column; columns the schema does not declare are Text.
    pub fn kind_of(&self, column: &str) -> FieldKind {
        self.field(column).map(|f| f.kind).unwrap_or(FieldKind::Text)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Canonical header line, e.g. for a sample file.
    pub fn header_line(&self) -> String {
        self.fields.iter().map(|f| f.name).collect::<Vec<_>>().join(",")
    }
}
