use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::types::StatusKind;

/// Roles a form field can play for the widget. Binding is by role, so the
/// widget stays independent of any particular form layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    PostalCode,
    Street,
    Neighborhood,
    City,
    State,
    /// House-number field; receives focus after a successful lookup.
    Number,
}

/// Cheap cloneable handle to one form field's value. Clones share the same
/// underlying string.
#[derive(Debug, Clone, Default)]
pub struct Field {
    value: Arc<Mutex<String>>,
}

impl Field {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> String {
        self.value.lock().unwrap().clone()
    }

    pub fn set(&self, value: impl Into<String>) {
        *self.value.lock().unwrap() = value.into();
    }
}

/// Shared handle to the status line: a message plus its visual kind.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    inner: Arc<Mutex<(String, StatusKind)>>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, message: impl Into<String>, kind: StatusKind) {
        *self.inner.lock().unwrap() = (message.into(), kind);
    }

    pub fn message(&self) -> String {
        self.inner.lock().unwrap().0.clone()
    }

    pub fn kind(&self) -> StatusKind {
        self.inner.lock().unwrap().1
    }
}

/// The widget's view of a form: field handles keyed by role, the status
/// line, and a focus slot.
///
/// Roles may be left unbound. Reading an unbound role yields `None` and
/// writing to it is a silent no-op, so a form without, say, a state field
/// still works with the same widget.
#[derive(Debug, Clone, Default)]
pub struct FormBinding {
    fields: HashMap<FieldRole, Field>,
    status: StatusLine,
    focus: Arc<Mutex<Option<FieldRole>>>,
}

impl FormBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// A binding with a fresh field for every role.
    pub fn standard() -> Self {
        let mut binding = Self::new();
        for role in [
            FieldRole::PostalCode,
            FieldRole::Street,
            FieldRole::Neighborhood,
            FieldRole::City,
            FieldRole::State,
            FieldRole::Number,
        ] {
            binding.fields.insert(role, Field::new());
        }
        binding
    }

    pub fn bind(mut self, role: FieldRole, field: Field) -> Self {
        self.fields.insert(role, field);
        self
    }

    pub fn field(&self, role: FieldRole) -> Option<&Field> {
        self.fields.get(&role)
    }

    /// Current value of a bound field; `None` when the role is unbound.
    pub fn field_value(&self, role: FieldRole) -> Option<String> {
        self.fields.get(&role).map(Field::value)
    }

    /// Write a bound field; no-op when the role is unbound.
    pub fn set_field(&self, role: FieldRole, value: impl Into<String>) {
        if let Some(field) = self.fields.get(&role) {
            field.set(value);
        }
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Move input focus to a role; no-op when the role is unbound.
    pub fn focus(&self, role: FieldRole) {
        if self.fields.contains_key(&role) {
            *self.focus.lock().unwrap() = Some(role);
        }
    }

    pub fn focused(&self) -> Option<FieldRole> {
        *self.focus.lock().unwrap()
    }
}
