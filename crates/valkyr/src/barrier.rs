use ash::vk;
use tinyvec::TinyVec;

///Derived transition descriptor for an image access. Produced by
/// [ImageState::sync](crate::state::ImageState::sync), consumed by recording
/// it into a command buffer before the access it guards.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageBarrier {
    pub src_stages: vk::PipelineStageFlags2,
    pub dst_stages: vk::PipelineStageFlags2,
    pub src_access: vk::AccessFlags2,
    pub dst_access: vk::AccessFlags2,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    ///Mip and layer window the transition applies to.
    pub range: vk::ImageSubresourceRange,
}

impl ImageBarrier {
    ///Builds the synchronization2 barrier for `image`.
    pub fn to_vk(&self, image: vk::Image) -> vk::ImageMemoryBarrier2<'static> {
        vk::ImageMemoryBarrier2::default()
            .image(image)
            .subresource_range(self.range)
            .src_stage_mask(self.src_stages)
            .src_access_mask(self.src_access)
            .old_layout(self.old_layout)
            .dst_stage_mask(self.dst_stages)
            .dst_access_mask(self.dst_access)
            .new_layout(self.new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
    }
}

///Derived transition descriptor for a buffer access. Covers the whole buffer
/// unless narrowed via `offset`/`size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferBarrier {
    pub src_stages: vk::PipelineStageFlags2,
    pub dst_stages: vk::PipelineStageFlags2,
    pub src_access: vk::AccessFlags2,
    pub dst_access: vk::AccessFlags2,
    pub offset: u64,
    pub size: u64,
}

impl Default for BufferBarrier {
    fn default() -> Self {
        BufferBarrier {
            src_stages: vk::PipelineStageFlags2::NONE,
            dst_stages: vk::PipelineStageFlags2::NONE,
            src_access: vk::AccessFlags2::NONE,
            dst_access: vk::AccessFlags2::NONE,
            offset: 0,
            size: vk::WHOLE_SIZE,
        }
    }
}

impl BufferBarrier {
    ///Builds the synchronization2 barrier for `buffer`.
    pub fn to_vk(&self, buffer: vk::Buffer) -> vk::BufferMemoryBarrier2<'static> {
        vk::BufferMemoryBarrier2::default()
            .buffer(buffer)
            .offset(self.offset)
            .size(self.size)
            .src_stage_mask(self.src_stages)
            .src_access_mask(self.src_access)
            .dst_stage_mask(self.dst_stages)
            .dst_access_mask(self.dst_access)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
    }
}

///Barrier building helper. Collects the barriers derived for one submission
/// point so they can be recorded as a single dependency.
///
/// Uses tinyvec internally, so the common case of a handful of barriers does
/// not allocate. The collection can outgrow the stack allocation.
#[derive(Debug, Default)]
pub struct BarrierBuilder {
    pub images: TinyVec<[vk::ImageMemoryBarrier2<'static>; Self::STACK_ALLOCATION]>,
    pub buffers: TinyVec<[vk::BufferMemoryBarrier2<'static>; Self::STACK_ALLOCATION]>,
}

impl BarrierBuilder {
    ///Amount of barriers per type that can be stack allocated.
    pub const STACK_ALLOCATION: usize = 6;

    pub fn new() -> Self {
        BarrierBuilder::default()
    }

    ///Adds the derived `barrier` for `image` to the batch.
    ///
    /// # Safety
    ///
    /// Make sure the `image` handle stays alive until the barrier is used on
    /// the GPU. This is not enforced by this object.
    pub fn image(&mut self, image: vk::Image, barrier: ImageBarrier) -> &mut Self {
        #[cfg(feature = "logging")]
        log::trace!("image barrier [{:?}] {:#?}", image, barrier);

        self.images.push(barrier.to_vk(image));
        self
    }

    ///Adds the derived `barrier` for `buffer` to the batch.
    ///
    /// # Safety see [Self::image].
    pub fn buffer(&mut self, buffer: vk::Buffer, barrier: BufferBarrier) -> &mut Self {
        #[cfg(feature = "logging")]
        log::trace!("buffer barrier [{:?}] {:#?}", buffer, barrier);

        self.buffers.push(barrier.to_vk(buffer));
        self
    }

    ///Pushes only a layout transition for the given region, with empty access
    /// scopes.
    ///
    /// # Safety see [Self::image].
    pub fn image_layout_transition(
        &mut self,
        image: vk::Image,
        range: vk::ImageSubresourceRange,
        src_layout: vk::ImageLayout,
        dst_layout: vk::ImageLayout,
    ) -> &mut Self {
        #[cfg(feature = "logging")]
        log::trace!("layout[{:?}] {:?} -> {:?}", image, src_layout, dst_layout);

        let item = vk::ImageMemoryBarrier2::default()
            .image(image)
            .subresource_range(range)
            .old_layout(src_layout)
            .new_layout(dst_layout);
        self.images.push(item);

        self
    }

    pub fn image_custom_barrier(&mut self, barrier: vk::ImageMemoryBarrier2<'static>) -> &mut Self {
        self.images.push(barrier);
        self
    }

    pub fn buffer_custom_barrier(
        &mut self,
        barrier: vk::BufferMemoryBarrier2<'static>,
    ) -> &mut Self {
        self.buffers.push(barrier);
        self
    }

    ///Runs `request` through the image's tracked state and records the
    /// resulting barrier, if one is needed.
    ///
    /// # Safety see [Self::image].
    pub fn sync_image(
        &mut self,
        image: vk::Image,
        state: &mut crate::state::ImageState,
        request: crate::state::ImageAccess,
    ) -> &mut Self {
        if let Some(barrier) = state.sync(request) {
            self.image(image, barrier);
        }
        self
    }

    ///Runs `request` through the buffer's tracked state and records the
    /// resulting barrier, if one is needed.
    ///
    /// # Safety see [Self::image].
    pub fn sync_buffer(
        &mut self,
        buffer: vk::Buffer,
        state: &mut crate::state::BufferState,
        request: crate::state::BufferAccess,
    ) -> &mut Self {
        if let Some(barrier) = state.sync(request) {
            self.buffer(buffer, barrier);
        }
        self
    }

    ///Returns the dependency info containing the currently pushed barriers,
    /// ready for `vkCmdPipelineBarrier2`.
    pub fn as_dependency_info(&self) -> vk::DependencyInfo<'_> {
        vk::DependencyInfo::default()
            .image_memory_barriers(self.images.as_slice())
            .buffer_memory_barriers(self.buffers.as_slice())
    }

    ///Returns true if at least one barrier has been added.
    pub fn has_barrier(&self) -> bool {
        !self.images.is_empty() || !self.buffers.is_empty()
    }
}
