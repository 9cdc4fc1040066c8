//! Extensions over the topology wire types: typed aspect access & object builders.

use prost::Message;

use super::topo::{object, Any, ControllerInfo, Entity, Object, P4RtMastershipState, P4RtServerInfo, Relation, SwitchInfo, TlsOptions};
use crate::error::{AppError, AppResult};

/// The relation kind connecting a controller to a switch it may master.
pub const KIND_CONTROLS: &str = "controls";
/// The entity kind of a controller replica.
pub const KIND_CONTROLLER: &str = "controller";
/// The entity kind of a P4 programmable switch.
pub const KIND_SWITCH: &str = "switch";

/// A typed value storable as an aspect on a topology object.
///
/// The set of aspect kinds is closed; each maps to a fixed type URL on the
/// wire.
pub trait AspectValue: Message + Default {
    const TYPE_URL: &'static str;
}

impl AspectValue for P4RtServerInfo {
    const TYPE_URL: &'static str = "onos.topo.P4RTServerInfo";
}

impl AspectValue for P4RtMastershipState {
    const TYPE_URL: &'static str = "onos.topo.P4RTMastershipState";
}

impl AspectValue for TlsOptions {
    const TYPE_URL: &'static str = "onos.topo.TLSOptions";
}

impl AspectValue for super::topo::Configurable {
    const TYPE_URL: &'static str = "onos.topo.Configurable";
}

impl AspectValue for SwitchInfo {
    const TYPE_URL: &'static str = "onos.topo.Switch";
}

impl AspectValue for ControllerInfo {
    const TYPE_URL: &'static str = "onos.topo.ControllerInfo";
}

impl Object {
    /// Create a new entity object of the given kind.
    pub fn new_entity(id: impl Into<String>, kind_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: 0,
            obj: Some(object::Obj::Entity(Entity { kind_id: kind_id.into() })),
            aspects: Default::default(),
        }
    }

    /// Create a new relation object of the given kind between two entities.
    pub fn new_relation(id: impl Into<String>, kind_id: impl Into<String>, src: impl Into<String>, tgt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: 0,
            obj: Some(object::Obj::Relation(Relation {
                kind_id: kind_id.into(),
                src_entity_id: src.into(),
                tgt_entity_id: tgt.into(),
            })),
            aspects: Default::default(),
        }
    }

    pub fn is_entity(&self) -> bool {
        matches!(self.obj, Some(object::Obj::Entity(_)))
    }

    /// Get the relation fields of this object, if it is a relation.
    pub fn relation(&self) -> Option<&Relation> {
        match &self.obj {
            Some(object::Obj::Relation(relation)) => Some(relation),
            _ => None,
        }
    }

    /// The kind ID of the object, whichever shape it has.
    pub fn kind_id(&self) -> &str {
        match &self.obj {
            Some(object::Obj::Entity(entity)) => &entity.kind_id,
            Some(object::Obj::Relation(relation)) => &relation.kind_id,
            None => "",
        }
    }

    /// Decode the aspect of type `T` attached to this object.
    pub fn get_aspect<T: AspectValue>(&self) -> AppResult<T> {
        let any = self
            .aspects
            .get(T::TYPE_URL)
            .ok_or_else(|| AppError::NotFound(format!("object '{}' has no aspect {}", self.id, T::TYPE_URL)))?;
        T::decode(any.value.as_slice()).map_err(|err| AppError::Invalid(format!("aspect {} decoding failed: {}", T::TYPE_URL, err)))
    }

    /// Attach or replace the aspect of type `T` on this object.
    pub fn set_aspect<T: AspectValue>(&mut self, aspect: &T) -> AppResult<()> {
        let mut buf = Vec::with_capacity(aspect.encoded_len());
        aspect
            .encode(&mut buf)
            .map_err(|err| AppError::Invalid(format!("aspect {} encoding failed: {}", T::TYPE_URL, err)))?;
        self.aspects.insert(
            T::TYPE_URL.to_string(),
            Any {
                type_url: T::TYPE_URL.to_string(),
                value: buf,
            },
        );
        Ok(())
    }
}
