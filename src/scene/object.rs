use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use super::graph::SceneContext;
use super::input::InputEvent;
use super::node::Node;
use crate::shape::Shape;
use crate::rendering::Material;

/// Rendering space of a template's instances. `World` nodes live in the
/// scene; `Screen` nodes are UI overlays sorted after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Space {
    #[default]
    World,
    Screen,
}

/// Physics profile shared by every instance of a template
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsTemplate {
    /// Rest mass in kg; individual spawns may override it
    pub mass: f64,
    /// Layer mask hook for collision filtering
    pub collision_layer: i32,
}

/// Behavior capability set of a template.
///
/// Any subset of the three hooks may be implemented; the tick loop
/// dispatches over whichever are present. A returned error is a
/// controller fault: it is logged and the node is marked for destroy at
/// tick end. Controllers mutate only their own node; cross-node effects
/// go through the scene queue on the context.
pub trait Controller: Send + Sync {
    fn init(&self, _node: &mut Node, _ctx: &mut SceneContext<'_>) -> Result<()> {
        Ok(())
    }

    fn update(&self, _node: &mut Node, _ctx: &mut SceneContext<'_>, _dt: Duration) -> Result<()> {
        Ok(())
    }

    fn input(&self, _node: &mut Node, _ctx: &mut SceneContext<'_>, _event: &InputEvent) -> Result<()> {
        Ok(())
    }
}

type InitFn = dyn Fn(&mut Node, &mut SceneContext<'_>) -> Result<()> + Send + Sync;
type UpdateFn = dyn Fn(&mut Node, &mut SceneContext<'_>, Duration) -> Result<()> + Send + Sync;
type InputFn = dyn Fn(&mut Node, &mut SceneContext<'_>, &InputEvent) -> Result<()> + Send + Sync;

/// Closure-based [`Controller`] for templates that don't warrant a type
#[derive(Default)]
pub struct ControllerFns {
    init: Option<Box<InitFn>>,
    update: Option<Box<UpdateFn>>,
    input: Option<Box<InputFn>>,
}

impl ControllerFns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_init(
        mut self,
        f: impl Fn(&mut Node, &mut SceneContext<'_>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.init = Some(Box::new(f));
        self
    }

    pub fn on_update(
        mut self,
        f: impl Fn(&mut Node, &mut SceneContext<'_>, Duration) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    pub fn on_input(
        mut self,
        f: impl Fn(&mut Node, &mut SceneContext<'_>, &InputEvent) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.input = Some(Box::new(f));
        self
    }
}

impl Controller for ControllerFns {
    fn init(&self, node: &mut Node, ctx: &mut SceneContext<'_>) -> Result<()> {
        match &self.init {
            Some(f) => f(node, ctx),
            None => Ok(()),
        }
    }

    fn update(&self, node: &mut Node, ctx: &mut SceneContext<'_>, dt: Duration) -> Result<()> {
        match &self.update {
            Some(f) => f(node, ctx, dt),
            None => Ok(()),
        }
    }

    fn input(&self, node: &mut Node, ctx: &mut SceneContext<'_>, event: &InputEvent) -> Result<()> {
        match &self.input {
            Some(f) => f(node, ctx, event),
            None => Ok(()),
        }
    }
}

/// Immutable template shared by every instance spawned from it
pub struct SceneObject {
    pub id: i32,
    pub material: Option<Material>,
    pub physics: Option<PhysicsTemplate>,
    pub shape: Option<Shape>,
    pub space: Space,
    pub controller: Option<Arc<dyn Controller>>,
}

/// Construction arguments for [`SceneObject::new`]
#[derive(Default)]
pub struct SceneObjectArgs {
    pub material: Option<Material>,
    pub physics: Option<PhysicsTemplate>,
    pub shape: Option<Shape>,
    /// Screen-space UI element
    pub ui_element: bool,
    pub controller: Option<Arc<dyn Controller>>,
}

impl SceneObject {
    pub fn new(args: SceneObjectArgs) -> Arc<Self> {
        Arc::new(Self {
            id: rand::random::<i32>(),
            material: args.material,
            physics: args.physics,
            shape: args.shape,
            space: if args.ui_element {
                Space::Screen
            } else {
                Space::World
            },
            controller: args.controller,
        })
    }

    /// Only templates with both a material and a shape stream instance
    /// blocks to sessions
    pub fn is_streamable(&self) -> bool {
        self.material.is_some() && self.shape.is_some()
    }
}

impl fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneObject")
            .field("id", &self.id)
            .field("space", &self.space)
            .field("material", &self.material.is_some())
            .field("physics", &self.physics)
            .field("shape", &self.shape.is_some())
            .field("controller", &self.controller.is_some())
            .finish()
    }
}
