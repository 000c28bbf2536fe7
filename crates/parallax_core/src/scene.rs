//! Minimal scene graph holding proxy groups

use crate::math::{Mat4, Quat, Vec3};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(0);

/// Handle of a group inside a [`Scene`]
///
/// Ids are unique across every scene in the process, so an id never matches
/// a group of a scene it was not issued by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupId(u64);

impl GroupId {
    fn next() -> Self {
        GroupId(NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Transform node that positions a proxy in the world
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Group {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Translation * rotation * scale
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::translation(self.position) * self.rotation.to_mat4() * Mat4::scale(self.scale)
    }
}

/// Flat collection of groups
#[derive(Debug, Default)]
pub struct Scene {
    groups: Vec<(GroupId, Group)>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, group: Group) -> GroupId {
        let id = GroupId::next();
        tracing::debug!("scene: added group `{}`", group.name);
        self.groups.push((id, group));
        id
    }

    pub fn remove(&mut self, id: GroupId) -> Option<Group> {
        let index = self.groups.iter().position(|(gid, _)| *gid == id)?;
        let (_, group) = self.groups.remove(index);
        tracing::debug!("scene: removed group `{}`", group.name);
        Some(group)
    }

    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|(gid, _)| *gid == id).map(|(_, g)| g)
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups
            .iter_mut()
            .find(|(gid, _)| *gid == id)
            .map(|(_, g)| g)
    }

    pub fn contains(&self, id: GroupId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove() {
        let mut scene = Scene::new();
        let a = scene.add(Group::new("a", Vec3::ZERO));
        let b = scene.add(Group::new("b", Vec3::ONE));
        assert_ne!(a, b);
        assert_eq!(scene.len(), 2);

        assert_eq!(scene.remove(a).map(|g| g.name), Some("a".to_string()));
        assert!(!scene.contains(a));
        assert!(scene.contains(b));
        assert!(scene.remove(a).is_none());
    }

    #[test]
    fn test_ids_are_unique_across_scenes() {
        let mut first = Scene::new();
        let mut second = Scene::new();
        let a = first.add(Group::new("a", Vec3::ZERO));
        let b = second.add(Group::new("b", Vec3::ZERO));
        assert_ne!(a, b);
        assert!(second.get(a).is_none());
        assert!(second.remove(a).is_none());
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_world_matrix_order() {
        let mut group = Group::new("proxy", Vec3::new(0.0, 1.7, 0.0));
        group.scale = Vec3::splat(2.0);
        group.rotation = Quat::from_axis_angle(Vec3::UP, std::f32::consts::FRAC_PI_2);
        let p = group.world_matrix().transform_point(Vec3::new(1.0, 0.0, 0.0));
        // scaled to 2, rotated onto -Z, then lifted
        assert!(p.x.abs() < 1e-5);
        assert!((p.y - 1.7).abs() < 1e-5);
        assert!((p.z + 2.0).abs() < 1e-5);
    }
}
