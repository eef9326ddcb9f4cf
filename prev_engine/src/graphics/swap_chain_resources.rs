/// SwapChainResources - per-resolution resource set and its ordered builder
///
/// The set is built stage by stage in [`ResourceStage::ORDER`]. Each stage
/// declares the stages it needs, and the builder refuses to run a stage whose
/// dependencies are not built yet, so a new kind of resource can't be slotted
/// in before what it depends on.

use std::fmt;

use crate::error::{Error, Result};
use crate::graphics::display_mode::PixelFormat;
use crate::graphics::driver::{DepthStencilDesc, Driver, RasterizerDesc, ResourceId, Viewport};

/// Format of the depth-stencil buffer
pub const DEPTH_STENCIL_FORMAT: PixelFormat = PixelFormat::D24UnormS8Uint;

/// One step of the resource build
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceStage {
    RenderTargetView,
    DepthStencilBuffer,
    DepthStencilState,
    DepthStencilView,
    RasterizerState,
    Viewport,
}

impl ResourceStage {
    /// Build order
    pub const ORDER: [ResourceStage; 6] = [
        ResourceStage::RenderTargetView,
        ResourceStage::DepthStencilBuffer,
        ResourceStage::DepthStencilState,
        ResourceStage::DepthStencilView,
        ResourceStage::RasterizerState,
        ResourceStage::Viewport,
    ];

    /// Stages that must be built before this one
    pub fn dependencies(self) -> &'static [ResourceStage] {
        match self {
            ResourceStage::DepthStencilView => &[ResourceStage::DepthStencilBuffer],
            _ => &[],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceStage::RenderTargetView => "render target view",
            ResourceStage::DepthStencilBuffer => "depth-stencil buffer",
            ResourceStage::DepthStencilState => "depth-stencil state",
            ResourceStage::DepthStencilView => "depth-stencil view",
            ResourceStage::RasterizerState => "rasterizer state",
            ResourceStage::Viewport => "viewport",
        }
    }
}

impl fmt::Display for ResourceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resources tied to one display-mode epoch
///
/// Owned by the graphics device only. Not `Clone`: releasing consumes it.
#[derive(Debug)]
pub struct SwapChainResources {
    render_target_view: ResourceId,
    depth_stencil_buffer: ResourceId,
    depth_stencil_state: ResourceId,
    depth_stencil_view: ResourceId,
    rasterizer_state: ResourceId,
    viewport: Viewport,
    width: u32,
    height: u32,
}

impl SwapChainResources {
    /// Number of driver objects in a complete set (the viewport is not one)
    pub const DRIVER_OBJECT_COUNT: usize = 5;

    /// Build a complete set for `width`x`height`
    ///
    /// Stages run in [`ResourceStage::ORDER`]. On failure every object
    /// already created is released before returning.
    ///
    /// # Errors
    ///
    /// `ResourceCreationError` carrying the stage that failed.
    pub fn build<D: Driver + ?Sized>(driver: &mut D, width: u32, height: u32) -> Result<Self> {
        let mut builder = ResourceBuilder::new(width, height);
        for stage in ResourceStage::ORDER {
            if let Err(e) = builder.run(driver, stage) {
                builder.release(driver);
                return Err(Error::ResourceCreationError {
                    stage,
                    message: e.message().to_string(),
                });
            }
        }
        builder.finish()
    }

    /// Bind the set to the command context
    pub fn bind<D: Driver + ?Sized>(&self, driver: &mut D) {
        driver.bind_render_targets(self.render_target_view, self.depth_stencil_view);
        driver.bind_depth_stencil_state(self.depth_stencil_state);
        driver.bind_rasterizer_state(self.rasterizer_state);
        driver.set_viewport(&self.viewport);
    }

    /// Release every driver object, in reverse build order
    pub fn release<D: Driver + ?Sized>(self, driver: &mut D) {
        driver.release(self.rasterizer_state);
        driver.release(self.depth_stencil_view);
        driver.release(self.depth_stencil_state);
        driver.release(self.depth_stencil_buffer);
        driver.release(self.render_target_view);
    }

    pub fn render_target_view(&self) -> ResourceId {
        self.render_target_view
    }

    pub fn depth_stencil_view(&self) -> ResourceId {
        self.depth_stencil_view
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// (width, height) the set was built for
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Partially built set
#[derive(Default)]
struct ResourceBuilder {
    width: u32,
    height: u32,
    render_target_view: Option<ResourceId>,
    depth_stencil_buffer: Option<ResourceId>,
    depth_stencil_state: Option<ResourceId>,
    depth_stencil_view: Option<ResourceId>,
    rasterizer_state: Option<ResourceId>,
    viewport: Option<Viewport>,
}

impl ResourceBuilder {
    fn new(width: u32, height: u32) -> Self {
        Self { width, height, ..Default::default() }
    }

    fn is_built(&self, stage: ResourceStage) -> bool {
        match stage {
            ResourceStage::RenderTargetView => self.render_target_view.is_some(),
            ResourceStage::DepthStencilBuffer => self.depth_stencil_buffer.is_some(),
            ResourceStage::DepthStencilState => self.depth_stencil_state.is_some(),
            ResourceStage::DepthStencilView => self.depth_stencil_view.is_some(),
            ResourceStage::RasterizerState => self.rasterizer_state.is_some(),
            ResourceStage::Viewport => self.viewport.is_some(),
        }
    }

    fn run<D: Driver + ?Sized>(&mut self, driver: &mut D, stage: ResourceStage) -> Result<()> {
        if let Some(missing) = stage.dependencies().iter().find(|dep| !self.is_built(**dep)) {
            return Err(Error::InvalidState(format!(
                "{} requires {} to be built first",
                stage, missing
            )));
        }

        match stage {
            ResourceStage::RenderTargetView => {
                self.render_target_view = Some(driver.create_render_target_view()?);
            }
            ResourceStage::DepthStencilBuffer => {
                self.depth_stencil_buffer = Some(driver.create_depth_stencil_buffer(
                    self.width,
                    self.height,
                    DEPTH_STENCIL_FORMAT,
                )?);
            }
            ResourceStage::DepthStencilState => {
                self.depth_stencil_state =
                    Some(driver.create_depth_stencil_state(&DepthStencilDesc::default())?);
            }
            ResourceStage::DepthStencilView => {
                let buffer = self.depth_stencil_buffer.ok_or_else(|| {
                    Error::InvalidState("depth-stencil buffer missing".to_string())
                })?;
                self.depth_stencil_view = Some(driver.create_depth_stencil_view(buffer)?);
            }
            ResourceStage::RasterizerState => {
                self.rasterizer_state =
                    Some(driver.create_rasterizer_state(&RasterizerDesc::default())?);
            }
            ResourceStage::Viewport => {
                self.viewport = Some(Viewport::full(self.width, self.height));
            }
        }
        Ok(())
    }

    /// Release whatever was built, reverse order
    fn release<D: Driver + ?Sized>(&mut self, driver: &mut D) {
        let built = [
            self.rasterizer_state.take(),
            self.depth_stencil_view.take(),
            self.depth_stencil_state.take(),
            self.depth_stencil_buffer.take(),
            self.render_target_view.take(),
        ];
        for id in built.into_iter().flatten() {
            driver.release(id);
        }
        self.viewport = None;
    }

    fn finish(self) -> Result<SwapChainResources> {
        let missing = |stage: ResourceStage| Error::ResourceCreationError {
            stage,
            message: "stage was not built".to_string(),
        };
        Ok(SwapChainResources {
            render_target_view: self
                .render_target_view
                .ok_or_else(|| missing(ResourceStage::RenderTargetView))?,
            depth_stencil_buffer: self
                .depth_stencil_buffer
                .ok_or_else(|| missing(ResourceStage::DepthStencilBuffer))?,
            depth_stencil_state: self
                .depth_stencil_state
                .ok_or_else(|| missing(ResourceStage::DepthStencilState))?,
            depth_stencil_view: self
                .depth_stencil_view
                .ok_or_else(|| missing(ResourceStage::DepthStencilView))?,
            rasterizer_state: self
                .rasterizer_state
                .ok_or_else(|| missing(ResourceStage::RasterizerState))?,
            viewport: self.viewport.ok_or_else(|| missing(ResourceStage::Viewport))?,
            width: self.width,
            height: self.height,
        })
    }
}

#[cfg(test)]
#[path = "swap_chain_resources_tests.rs"]
mod tests;
