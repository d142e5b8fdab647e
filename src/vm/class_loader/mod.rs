use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::vm::class::class::Class;
use crate::vm::error::VmError;

pub mod bootstrap;
pub mod link;
pub mod native;
pub mod path;

/// Resolve a qualified class name to a class, or report not-found.
pub trait ClassFinder {
    fn find_class(&self, name: &str) -> Result<Option<Class>, VmError>;
}

/// Tries each constituent finder in order; the first success wins.
pub struct CompositeClassFinder {
    finders: Vec<Box<dyn ClassFinder>>,
}

impl CompositeClassFinder {
    pub fn new(finders: Vec<Box<dyn ClassFinder>>) -> CompositeClassFinder {
        CompositeClassFinder { finders }
    }
}

impl ClassFinder for CompositeClassFinder {
    fn find_class(&self, name: &str) -> Result<Option<Class>, VmError> {
        for finder in &self.finders {
            if let Some(class) = finder.find_class(name)? {
                return Ok(Some(class));
            }
        }

        Ok(None)
    }
}

pub struct LoadOutcome {
    /// None when no finder resolved the name; the caller decides whether
    /// that is fatal.
    pub class: Option<Rc<Class>>,
    pub cached: bool,
}

/// The memoizing front door all loading goes through. Names are normalized
/// (dots to path separators) and successful loads are registered before
/// being returned, so a name is resolved at most once per process.
pub struct ClassRegistry {
    finder: CompositeClassFinder,
    loaded: HashMap<String, Rc<Class>>,
}

impl ClassRegistry {
    pub fn new(finder: CompositeClassFinder) -> ClassRegistry {
        ClassRegistry {
            finder,
            loaded: HashMap::new(),
        }
    }

    pub fn load(&mut self, name: &str) -> Result<LoadOutcome, VmError> {
        let key = name.replace('.', "/");

        if let Some(class) = self.loaded.get(&key) {
            return Ok(LoadOutcome {
                class: Some(Rc::clone(class)),
                cached: true,
            });
        }

        match self.finder.find_class(&key)? {
            Some(class) => {
                debug!("loaded class {}", class.name);
                let class = Rc::new(class);
                self.loaded.insert(key, Rc::clone(&class));
                Ok(LoadOutcome {
                    class: Some(class),
                    cached: false,
                })
            }
            None => Ok(LoadOutcome {
                class: None,
                cached: false,
            }),
        }
    }

    /// Cache-only lookup, without driving the finders.
    pub fn get(&self, name: &str) -> Option<&Rc<Class>> {
        self.loaded.get(&name.replace('.', "/"))
    }
}
