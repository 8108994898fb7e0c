use std::collections::{BTreeMap, HashMap};

use crate::{
    ClassDef, Element, ElementData, ElementPtr, Event, ManifestError, Method, Routine, StateDef,
    StateMode,
};

/// Pointers to the state elements of a manifest, at most one per mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStateMatrix {
    persistent: Option<ElementPtr>,
    ephemeral: Option<ElementPtr>,
}

impl ContextStateMatrix {
    pub fn new<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Result<Self, ManifestError> {
        let mut matrix = Self::default();
        for element in elements {
            let ElementData::State(state) = &element.data else {
                continue;
            };
            let slot = match state.mode {
                StateMode::Persistent => &mut matrix.persistent,
                StateMode::Ephemeral => &mut matrix.ephemeral,
            };
            if let Some(existing) = slot {
                return Err(ManifestError::InvalidArgument(format!(
                    "duplicate {} state: elements {existing} and {}",
                    state.mode, element.ptr
                )));
            }
            *slot = Some(element.ptr);
        }
        Ok(matrix)
    }

    pub fn persistent(&self) -> bool {
        self.persistent.is_some()
    }

    pub fn ephemeral(&self) -> bool {
        self.ephemeral.is_some()
    }

    pub fn get(&self, mode: StateMode) -> Option<ElementPtr> {
        match mode {
            StateMode::Persistent => self.persistent,
            StateMode::Ephemeral => self.ephemeral,
        }
    }
}

/// Immutable lookup tables over the elements of a manifest.
///
/// Classes, routines, methods and events are indexed by name and resolve back
/// to their element through its pointer.
#[derive(Debug, Clone, Default)]
pub struct ElementDescriptor {
    elements: BTreeMap<ElementPtr, Element>,
    classes: HashMap<String, ElementPtr>,
    callsites: HashMap<String, ElementPtr>,
    methods: HashMap<String, ElementPtr>,
    events: HashMap<String, ElementPtr>,
    states: ContextStateMatrix,
}

impl ElementDescriptor {
    pub fn new(elements: impl IntoIterator<Item = Element>) -> Result<Self, ManifestError> {
        let mut descriptor = Self::default();
        for element in elements {
            let ptr = element.ptr;
            let index = match &element.data {
                ElementData::Class(class) => Some((&mut descriptor.classes, class.name.clone())),
                ElementData::Routine(routine) => {
                    Some((&mut descriptor.callsites, routine.name.clone()))
                }
                ElementData::Method(method) => Some((&mut descriptor.methods, method.name.clone())),
                ElementData::Event(event) => Some((&mut descriptor.events, event.name.clone())),
                _ => None,
            };
            if let Some((table, name)) = index {
                if table.insert(name.clone(), ptr).is_some() {
                    return Err(ManifestError::InvalidArgument(format!(
                        "duplicate {} name '{name}'",
                        element.kind()
                    )));
                }
            }
            if descriptor.elements.insert(ptr, element).is_some() {
                return Err(ManifestError::InvalidArgument(format!(
                    "duplicate element pointer {ptr}"
                )));
            }
        }
        descriptor.states = ContextStateMatrix::new(descriptor.elements.values())?;
        Ok(descriptor)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn element(&self, ptr: ElementPtr) -> Result<&Element, ManifestError> {
        self.elements
            .get(&ptr)
            .ok_or_else(|| ManifestError::not_found("element", ptr))
    }

    pub fn state_matrix(&self) -> &ContextStateMatrix {
        &self.states
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn class(&self, name: &str) -> Result<&ClassDef, ManifestError> {
        let ptr = self
            .classes
            .get(name)
            .ok_or_else(|| ManifestError::not_found("class", name))?;
        match &self.element(*ptr)?.data {
            ElementData::Class(class) => Ok(class),
            _ => Err(ManifestError::not_found("class", name)),
        }
    }

    pub fn routine(&self, name: &str) -> Result<&Routine, ManifestError> {
        let ptr = self
            .callsites
            .get(name)
            .ok_or_else(|| ManifestError::not_found("routine", name))?;
        match &self.element(*ptr)?.data {
            ElementData::Routine(routine) => Ok(routine),
            _ => Err(ManifestError::not_found("routine", name)),
        }
    }

    pub fn method(&self, name: &str) -> Result<&Method, ManifestError> {
        let ptr = self
            .methods
            .get(name)
            .ok_or_else(|| ManifestError::not_found("method", name))?;
        match &self.element(*ptr)?.data {
            ElementData::Method(method) => Ok(method),
            _ => Err(ManifestError::not_found("method", name)),
        }
    }

    pub fn event(&self, name: &str) -> Result<&Event, ManifestError> {
        let ptr = self
            .events
            .get(name)
            .ok_or_else(|| ManifestError::not_found("event", name))?;
        match &self.element(*ptr)?.data {
            ElementData::Event(event) => Ok(event),
            _ => Err(ManifestError::not_found("event", name)),
        }
    }

    /// Methods bound to `class`, ordered by element pointer.
    pub fn class_methods(&self, class: &str) -> Result<Vec<&Method>, ManifestError> {
        if !self.has_class(class) {
            return Err(ManifestError::not_found("class", class));
        }
        Ok(self
            .elements
            .values()
            .filter_map(|element| match &element.data {
                ElementData::Method(method) if method.class == class => Some(method),
                _ => None,
            })
            .collect())
    }

    /// State element declared for `mode`, if any.
    pub fn state(&self, mode: StateMode) -> Option<(ElementPtr, &StateDef)> {
        let ptr = self.states.get(mode)?;
        match &self.elements.get(&ptr)?.data {
            ElementData::State(state) => Some((ptr, state)),
            _ => None,
        }
    }
}
