use serde::Serialize;

/// An option offered on the intake form, as its wire ID and the text
/// shown next to it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Label(Id, &'static str);

impl Label {
    pub fn new(id: Id, label: &'static str) -> Self {
        Label(id, label)
    }

    pub fn id(&self) -> Id {
        self.0
    }

    pub fn text(&self) -> &'static str {
        self.1
    }
}

/// The stable identifier a choice is submitted as.
pub type Id = &'static str;
