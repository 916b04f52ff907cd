//! Viewing arbitrary selected objects as workspace resources.

use crate::domain::model::{ProjectRef, ResourceRef};

/// Capability implemented by anything that may appear in a selection.
///
/// Types that are resources, wrap one, or can reach one through an association return it
/// from [`Adaptable::as_resource`]. Everything else returns `None`, which callers treat as
/// "skip this candidate".
pub trait Adaptable {
    fn as_resource(&self) -> Option<ResourceRef>;
}

/// View `candidate` as a resource, if it supports that capability.
pub fn adapt(candidate: &dyn Adaptable) -> Option<ResourceRef> {
    candidate.as_resource()
}

impl Adaptable for ResourceRef {
    fn as_resource(&self) -> Option<ResourceRef> {
        Some(self.clone())
    }
}

/// A project is its own root resource.
impl Adaptable for ProjectRef {
    fn as_resource(&self) -> Option<ResourceRef> {
        Some(ResourceRef::new(self.root.clone(), self.clone()))
    }
}

impl<T: Adaptable + ?Sized> Adaptable for &T {
    fn as_resource(&self) -> Option<ResourceRef> {
        (**self).as_resource()
    }
}

impl<T: Adaptable + ?Sized> Adaptable for Box<T> {
    fn as_resource(&self) -> Option<ResourceRef> {
        (**self).as_resource()
    }
}

impl<T: Adaptable> Adaptable for Option<T> {
    fn as_resource(&self) -> Option<ResourceRef> {
        self.as_ref().and_then(Adaptable::as_resource)
    }
}

/// Free-form selection entries such as labels or working-set names.
impl Adaptable for str {
    fn as_resource(&self) -> Option<ResourceRef> {
        None
    }
}

impl Adaptable for String {
    fn as_resource(&self) -> Option<ResourceRef> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resources_adapt_to_themselves() {
        let project = ProjectRef::new("core", "/ws/core");
        let resource = ResourceRef::new("/ws/core/build.gradle", project);
        assert_eq!(adapt(&resource), Some(resource.clone()));
    }

    #[test]
    fn projects_adapt_to_their_root() {
        let project = ProjectRef::new("core", "/ws/core");
        let resource = adapt(&project).expect("project adapts");
        assert_eq!(resource.path, project.root);
        assert_eq!(resource.project, project);
    }

    #[test]
    fn unrelated_objects_do_not_adapt() {
        assert_eq!(adapt(&"working set"), None);
        assert_eq!(adapt(&String::from("label")), None);
        assert_eq!(adapt(&None::<ResourceRef>), None);
    }
}
