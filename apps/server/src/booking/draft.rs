use serde::{Deserialize, Serialize};

/// How the visit is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitType {
    Video,
    InPerson,
    HomeVisit,
}

/// Draft fields a step can require. The selected service is not listed:
/// it is fixed when the flow starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    Time,
    VisitType,
    Reason,
    Notes,
    PaymentMethod,
}

/// A single field-level setter. `None` clears the field.
///
/// On the wire: `{"field": "date", "value": "2026-03-01"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum DraftUpdate {
    Date(Option<String>),
    Time(Option<String>),
    VisitType(Option<VisitType>),
    Reason(Option<String>),
    Notes(Option<String>),
    PaymentMethod(Option<String>),
}

impl DraftUpdate {
    pub fn field(&self) -> Field {
        match self {
            DraftUpdate::Date(_) => Field::Date,
            DraftUpdate::Time(_) => Field::Time,
            DraftUpdate::VisitType(_) => Field::VisitType,
            DraftUpdate::Reason(_) => Field::Reason,
            DraftUpdate::Notes(_) => Field::Notes,
            DraftUpdate::PaymentMethod(_) => Field::PaymentMethod,
        }
    }
}

/// In-progress reservation accumulated across wizard steps.
///
/// Every update touches exactly one field. Nothing here checks one field
/// against another: an unavailable slot or payment method is filtered out
/// before it reaches the draft, never by the draft itself.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDraft<S> {
    selected_service: S,
    date: Option<String>,
    time: Option<String>,
    visit_type: Option<VisitType>,
    reason: Option<String>,
    notes: Option<String>,
    payment_method_id: Option<String>,
}

impl<S> BookingDraft<S> {
    pub fn new(selected_service: S) -> Self {
        Self {
            selected_service,
            date: None,
            time: None,
            visit_type: None,
            reason: None,
            notes: None,
            payment_method_id: None,
        }
    }

    pub fn apply(&mut self, update: DraftUpdate) {
        match update {
            DraftUpdate::Date(v) => self.date = v,
            DraftUpdate::Time(v) => self.time = v,
            DraftUpdate::VisitType(v) => self.visit_type = v,
            DraftUpdate::Reason(v) => self.reason = v,
            DraftUpdate::Notes(v) => self.notes = v,
            DraftUpdate::PaymentMethod(v) => self.payment_method_id = v,
        }
    }

    pub fn apply_all(&mut self, updates: impl IntoIterator<Item = DraftUpdate>) {
        for update in updates {
            self.apply(update);
        }
    }

    /// Presence check used by step gating. Empty strings count as unset.
    pub fn is_set(&self, field: Field) -> bool {
        fn present(v: &Option<String>) -> bool {
            v.as_deref().is_some_and(|s| !s.is_empty())
        }

        match field {
            Field::Date => present(&self.date),
            Field::Time => present(&self.time),
            Field::VisitType => self.visit_type.is_some(),
            Field::Reason => present(&self.reason),
            Field::Notes => present(&self.notes),
            Field::PaymentMethod => present(&self.payment_method_id),
        }
    }

    pub fn selected_service(&self) -> &S {
        &self.selected_service
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    pub fn visit_type(&self) -> Option<VisitType> {
        self.visit_type
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn payment_method_id(&self) -> Option<&str> {
        self.payment_method_id.as_deref()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> BookingDraft<&'static str> {
        BookingDraft::new("doc-1")
    }

    #[test]
    fn test_new_draft_is_empty() {
        let d = draft();
        assert_eq!(*d.selected_service(), "doc-1");
        for field in [
            Field::Date,
            Field::Time,
            Field::VisitType,
            Field::Reason,
            Field::Notes,
            Field::PaymentMethod,
        ] {
            assert!(!d.is_set(field), "{:?} should start unset", field);
        }
    }

    #[test]
    fn test_apply_touches_only_one_field() {
        let mut d = draft();
        d.apply(DraftUpdate::Date(Some("2026-03-01".into())));
        d.apply(DraftUpdate::Reason(Some("checkup".into())));

        d.apply(DraftUpdate::Time(Some("10:00".into())));
        assert_eq!(d.date(), Some("2026-03-01"));
        assert_eq!(d.reason(), Some("checkup"));
        assert_eq!(d.time(), Some("10:00"));
    }

    #[test]
    fn test_apply_none_clears_field() {
        let mut d = draft();
        d.apply(DraftUpdate::Date(Some("2026-03-01".into())));
        d.apply(DraftUpdate::Date(None));
        assert!(!d.is_set(Field::Date));
        assert_eq!(d.date(), None);
    }

    #[test]
    fn test_empty_string_counts_as_unset() {
        let mut d = draft();
        d.apply(DraftUpdate::Time(Some(String::new())));
        assert!(!d.is_set(Field::Time));
    }

    #[test]
    fn test_apply_all_last_write_wins() {
        let mut d = draft();
        d.apply_all([
            DraftUpdate::VisitType(Some(VisitType::Video)),
            DraftUpdate::VisitType(Some(VisitType::InPerson)),
            DraftUpdate::Notes(Some("bring reports".into())),
        ]);
        assert_eq!(d.visit_type(), Some(VisitType::InPerson));
        assert_eq!(d.notes(), Some("bring reports"));
    }

    #[test]
    fn test_store_accepts_any_payment_method_id() {
        // Availability is checked by the caller, not the draft.
        let mut d = draft();
        d.apply(DraftUpdate::PaymentMethod(Some("does-not-exist".into())));
        assert_eq!(d.payment_method_id(), Some("does-not-exist"));
        assert!(d.is_set(Field::PaymentMethod));
    }

    #[test]
    fn test_update_wire_format() {
        let update: DraftUpdate =
            serde_json::from_str(r#"{"field":"visit_type","value":"in_person"}"#).unwrap();
        assert_eq!(update, DraftUpdate::VisitType(Some(VisitType::InPerson)));

        let clear: DraftUpdate = serde_json::from_str(r#"{"field":"date","value":null}"#).unwrap();
        assert_eq!(clear, DraftUpdate::Date(None));
        assert_eq!(clear.field(), Field::Date);
    }
}
