use crate::audio::domain::transformation::Transformation;

/// Ordered transformations; insertion order is execution order.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Transformation>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(mut self, transformation: impl Transformation + 'static) -> Self {
        self.stages.push(Box::new(transformation));
        self
    }

    pub fn push(&mut self, transformation: Box<dyn Transformation>) {
        self.stages.push(transformation);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Box<dyn Transformation>> {
        self.stages.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.stages.iter().map(|t| t.name()).collect()
    }
}

impl FromIterator<Box<dyn Transformation>> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Box<dyn Transformation>>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}
