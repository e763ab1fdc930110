//! Document structure produced by the mapping engine.

use std::fmt;

use super::field::Field;

/// A document: an id plus the ordered list of fields extracted from it.
#[derive(Clone, Debug, Default)]
pub struct Document {
    id: String,
    fields: Vec<Field>,
}

impl Document {
    /// Create a new empty document.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Document {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a field. Repeated names are allowed and keep their order.
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Builder-style variant of [`Document::add_field`].
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// All fields with the given name, in insertion order.
    pub fn fields_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.name() == name)
    }

    /// Get the first field with the given name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Document{{id: {}, fields: [", self.id)?;
        for field in &self.fields {
            writeln!(
                f,
                "  {} {:?} ({}): {}",
                field.name(),
                field.array_positions(),
                field.value().type_name(),
                field.value()
            )?;
        }
        write!(f, "]}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_named_keeps_order() {
        let doc = Document::new("1")
            .with_field(Field::text("tag", vec![0], "a"))
            .with_field(Field::numeric("n", vec![], 1.0))
            .with_field(Field::text("tag", vec![1], "b"));

        let tags: Vec<_> = doc.fields_named("tag").filter_map(|f| f.as_text()).collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.id(), "1");
    }
}
