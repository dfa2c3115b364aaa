use std::collections::BTreeMap;
use std::path::Path;

use crate::foundation::error::{AvmixError, AvmixResult};
use crate::transition::fade::Fade;
use crate::transition::gltrans::GlTrans;
use crate::transition::mix::Mix;
use crate::transition::module::TransitionModule;
use crate::transition::swipe::Swipe;

pub type TransitionOptions = serde_json::Map<String, serde_json::Value>;

/// Constructor for one transition type.
pub type TransitionFactory = fn(&TransitionOptions) -> AvmixResult<Box<dyn TransitionModule>>;

/// Transition types keyed by name.
#[derive(Clone, Debug)]
pub struct TransitionRegistry {
    factories: BTreeMap<String, TransitionFactory>,
}

impl Default for TransitionRegistry {
    fn default() -> Self {
        let mut r = Self::empty();
        r.register("mix", |_| Ok(Box::new(Mix)));
        r.register("fade", |o| Ok(Box::new(Fade::new(o)?)));
        r.register("swipe", |o| Ok(Box::new(Swipe::new(o)?)));
        r.register("gltrans", |o| Ok(Box::new(GlTrans::new(o)?)));
        r
    }
}

impl TransitionRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, factory: TransitionFactory) {
        self.factories
            .insert(name.trim().to_ascii_lowercase(), factory);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate and set up a module. A type ending in `.glsl` is loaded as `gltrans` from
    /// that file.
    pub fn create(
        &self,
        kind: &str,
        options: &TransitionOptions,
    ) -> AvmixResult<Box<dyn TransitionModule>> {
        let kind = kind.trim();
        let mut module: Box<dyn TransitionModule> = if kind.ends_with(".glsl") {
            Box::new(GlTrans::from_file(Path::new(kind), options)?)
        } else {
            let key = kind.to_ascii_lowercase();
            let factory = self.factories.get(&key).ok_or_else(|| {
                AvmixError::resource(format!("unknown transition type '{kind}'"))
            })?;
            factory(options)?
        };
        module.setup()?;
        Ok(module)
    }
}
