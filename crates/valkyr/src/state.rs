use ash::vk;

use crate::access::{is_read_access, is_write_access};
use crate::barrier::{BufferBarrier, ImageBarrier};

///Where the last recorded access sits in the read/write ordering of a
/// resource. Determines which previous accesses a new access has to wait on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AccessSequence {
    ///No access recorded yet.
    #[default]
    None,
    ///One or more reads with no write before them. Slot 0 holds the merged
    /// read set.
    Reads,
    ///A write with nothing after it. Slot 0 holds the write.
    Write,
    ///Reads that followed a write. Slot 0 holds the write, slot 1 the merged
    /// read set since that write.
    ReadAfterWrite,
}

///One point-in-time usage request against a buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferAccess {
    pub stages: vk::PipelineStageFlags2,
    pub access: vk::AccessFlags2,
}

///One point-in-time usage request against an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageAccess {
    pub stages: vk::PipelineStageFlags2,
    pub access: vk::AccessFlags2,
    pub layout: vk::ImageLayout,
}

///Tracked access history of a buffer between submissions.
///
/// The history is a sequential log: reads between two writes are merged into
/// one cumulative record, writes form barriers the following accesses wait
/// on. Feed every access in submission order through [sync](Self::sync).
#[derive(Clone, Debug, Default)]
pub struct BufferState {
    access: [BufferAccess; 2],
    sequence: AccessSequence,
}

impl BufferState {
    pub fn new() -> Self {
        BufferState::default()
    }

    ///The sequence tag the tracker is currently in.
    pub fn sequence(&self) -> AccessSequence {
        self.sequence
    }

    ///Decides whether `request` needs a barrier before it may execute.
    ///
    /// Returns the barrier to record ahead of the access, or `None` if the
    /// request can be folded into the current access set. Either way the
    /// request is recorded as the newest access.
    pub fn sync(&mut self, request: BufferAccess) -> Option<BufferBarrier> {
        let has_write = is_write_access(request.access);
        let has_read = is_read_access(request.access);

        match self.sequence {
            //no accessor before this, nothing to wait on
            AccessSequence::None => {
                if has_write {
                    self.sequence = AccessSequence::Write;
                    self.access[0] = request;
                } else if has_read {
                    self.sequence = AccessSequence::Reads;
                    self.access[0] = request;
                }
                None
            }
            AccessSequence::Reads => {
                if has_write {
                    //wait till done reading before modifying. The sequence is
                    // reset since all stages following this write wait on the
                    // write alone.
                    let previous_reads = self.access[0];
                    self.sequence = AccessSequence::Write;
                    self.access[0] = request;
                    self.access[1] = BufferAccess::default();
                    Some(BufferBarrier {
                        src_stages: previous_reads.stages,
                        dst_stages: request.stages,
                        src_access: previous_reads.access,
                        dst_access: request.access,
                        ..BufferBarrier::default()
                    })
                } else if has_read {
                    //combine all subsequent reads, so the next writer knows to
                    // wait on the union of them
                    self.access[0].stages |= request.stages;
                    self.access[0].access |= request.access;
                    None
                } else {
                    None
                }
            }
            AccessSequence::Write => {
                if has_write {
                    //the previous write already waited on whatever came before
                    // it, so only it remains relevant
                    let previous_write = self.access[0];
                    self.access[0] = request;
                    Some(BufferBarrier {
                        src_stages: previous_write.stages,
                        dst_stages: request.stages,
                        src_access: previous_write.access,
                        dst_access: request.access,
                        ..BufferBarrier::default()
                    })
                } else if has_read {
                    //wait till all write stages are done
                    self.sequence = AccessSequence::ReadAfterWrite;
                    self.access[1] = request;
                    Some(BufferBarrier {
                        src_stages: self.access[0].stages,
                        dst_stages: request.stages,
                        src_access: self.access[0].access,
                        dst_access: request.access,
                        ..BufferBarrier::default()
                    })
                } else {
                    None
                }
            }
            AccessSequence::ReadAfterWrite => {
                if has_write {
                    //wait for the reading stages only. They already waited on
                    // the write, so it does not need to be re-waited here.
                    let previous_reads = self.access[1];
                    self.sequence = AccessSequence::Write;
                    self.access[0] = request;
                    self.access[1] = BufferAccess::default();
                    Some(BufferBarrier {
                        src_stages: previous_reads.stages,
                        dst_stages: request.stages,
                        src_access: previous_reads.access,
                        dst_access: request.access,
                        ..BufferBarrier::default()
                    })
                } else if has_read {
                    //if stage and access intersect the already recorded read
                    // set, the earlier barrier covers this request as well
                    if self.access[1].stages.intersects(request.stages)
                        && self.access[1].access.intersects(request.access)
                    {
                        return None;
                    }

                    //otherwise wait on the write and widen the read set so the
                    // next writer waits on all reads
                    self.access[1].stages |= request.stages;
                    self.access[1].access |= request.access;
                    Some(BufferBarrier {
                        src_stages: self.access[0].stages,
                        dst_stages: request.stages,
                        src_access: self.access[0].access,
                        dst_access: request.access,
                        ..BufferBarrier::default()
                    })
                } else {
                    None
                }
            }
        }
    }
}

///Tracked access history of an image between submissions.
///
/// Works like [BufferState], with one addition: a layout change is treated as
/// a write even when the requesting access only reads, since the transition
/// rewrites the image's memory arrangement.
#[derive(Clone, Debug)]
pub struct ImageState {
    access: [ImageAccess; 2],
    sequence: AccessSequence,
    range: vk::ImageSubresourceRange,
}

impl ImageState {
    ///Tracker for an image that has never been accessed. The first request
    /// transitions from `UNDEFINED` with an empty source scope.
    pub fn uninitialized(range: vk::ImageSubresourceRange) -> Self {
        ImageState {
            access: [ImageAccess::default(); 2],
            sequence: AccessSequence::None,
            range,
        }
    }

    ///Tracker for an image whose layout was established elsewhere, for
    /// example a freshly acquired swapchain image. Assumes all prior work on
    /// the image has completed.
    pub fn with_layout(layout: vk::ImageLayout, range: vk::ImageSubresourceRange) -> Self {
        ImageState {
            access: [
                ImageAccess {
                    stages: vk::PipelineStageFlags2::NONE,
                    access: vk::AccessFlags2::NONE,
                    layout,
                },
                ImageAccess::default(),
            ],
            sequence: AccessSequence::None,
            range,
        }
    }

    ///The layout the image is currently in.
    pub fn layout(&self) -> vk::ImageLayout {
        self.access[0].layout
    }

    ///The subresource range this state tracks.
    pub fn range(&self) -> vk::ImageSubresourceRange {
        self.range
    }

    ///The sequence tag the tracker is currently in.
    pub fn sequence(&self) -> AccessSequence {
        self.sequence
    }

    ///Decides whether `request` needs a barrier before it may execute, and
    /// derives the layout transition if the requested layout differs from the
    /// current one.
    ///
    /// Returns the barrier to record ahead of the access, or `None` if the
    /// request can be folded into the current access set. Either way the
    /// request is recorded as the newest access.
    pub fn sync(&mut self, request: ImageAccess) -> Option<ImageBarrier> {
        let current_layout = self.access[0].layout;
        let needs_layout_transition = current_layout != request.layout;
        //layout transitions rewrite the image memory, so they count as writes
        // even if the requesting access only reads
        let has_write = is_write_access(request.access) || needs_layout_transition;
        let has_read = is_read_access(request.access);

        let range = self.range;
        let barrier = move |src: ImageAccess| ImageBarrier {
            src_stages: src.stages,
            dst_stages: request.stages,
            src_access: src.access,
            dst_access: request.access,
            old_layout: current_layout,
            new_layout: request.layout,
            range,
        };

        match self.sequence {
            //no accessor before this, nothing to wait on
            AccessSequence::None => {
                if has_write {
                    self.sequence = AccessSequence::Write;
                    self.access[0] = request;

                    if needs_layout_transition {
                        return Some(barrier(ImageAccess {
                            stages: vk::PipelineStageFlags2::NONE,
                            access: vk::AccessFlags2::NONE,
                            layout: current_layout,
                        }));
                    }
                    None
                } else if has_read {
                    self.sequence = AccessSequence::Reads;
                    self.access[0] = request;
                    None
                } else {
                    None
                }
            }
            AccessSequence::Reads => {
                if has_write {
                    //wait till done reading before modifying. The sequence is
                    // reset since all stages following this write wait on the
                    // write alone.
                    let previous_reads = self.access[0];
                    self.sequence = AccessSequence::Write;
                    self.access[0] = request;
                    self.access[1] = ImageAccess::default();
                    Some(barrier(previous_reads))
                } else if has_read {
                    //combine all subsequent reads, so the next writer knows to
                    // wait on the union of them
                    self.access[0].stages |= request.stages;
                    self.access[0].access |= request.access;
                    None
                } else {
                    None
                }
            }
            AccessSequence::Write => {
                if has_write {
                    //the previous write already waited on whatever came before
                    // it, so only it remains relevant
                    let previous_write = self.access[0];
                    self.access[0] = request;
                    Some(barrier(previous_write))
                } else if has_read {
                    //wait till all write stages are done
                    self.sequence = AccessSequence::ReadAfterWrite;
                    self.access[1] = request;
                    Some(barrier(self.access[0]))
                } else {
                    None
                }
            }
            AccessSequence::ReadAfterWrite => {
                if has_write {
                    //wait for the reading stages only. They already waited on
                    // the write, so it does not need to be re-waited here.
                    let previous_reads = self.access[1];
                    self.sequence = AccessSequence::Write;
                    self.access[0] = request;
                    self.access[1] = ImageAccess::default();
                    Some(barrier(previous_reads))
                } else if has_read {
                    //if stage and access intersect the already recorded read
                    // set, the earlier barrier covers this request as well
                    if self.access[1].stages.intersects(request.stages)
                        && self.access[1].access.intersects(request.access)
                    {
                        return None;
                    }

                    //otherwise wait on the write and widen the read set so the
                    // next writer waits on all reads
                    self.access[1].stages |= request.stages;
                    self.access[1].access |= request.access;
                    Some(barrier(self.access[0]))
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    fn color_range() -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        }
    }

    fn sampled_read(stages: vk::PipelineStageFlags2) -> ImageAccess {
        ImageAccess {
            stages,
            access: vk::AccessFlags2::SHADER_SAMPLED_READ,
            layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }

    fn transfer_write() -> ImageAccess {
        ImageAccess {
            stages: vk::PipelineStageFlags2::TRANSFER,
            access: vk::AccessFlags2::TRANSFER_WRITE,
            layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        }
    }

    #[test]
    fn first_access_transitions_from_undefined() {
        let mut state = ImageState::uninitialized(color_range());
        let barrier = state
            .sync(transfer_write())
            .expect("first access must produce a layout transition");

        assert_eq!(barrier.old_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(barrier.new_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        assert_eq!(barrier.src_stages, vk::PipelineStageFlags2::NONE);
        assert_eq!(barrier.src_access, vk::AccessFlags2::NONE);
        assert_eq!(barrier.dst_stages, vk::PipelineStageFlags2::TRANSFER);
        assert_eq!(barrier.dst_access, vk::AccessFlags2::TRANSFER_WRITE);
        assert_eq!(barrier.range.aspect_mask, vk::ImageAspectFlags::COLOR);
    }

    #[test]
    fn first_read_in_known_layout_needs_no_barrier() {
        let mut state = ImageState::with_layout(
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            color_range(),
        );
        assert!(state
            .sync(sampled_read(vk::PipelineStageFlags2::FRAGMENT_SHADER))
            .is_none());
        assert_eq!(state.sequence(), AccessSequence::Reads);
    }

    #[test]
    fn reads_merge_and_writer_waits_on_their_union() {
        let mut state = ImageState::with_layout(
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            color_range(),
        );

        assert!(state
            .sync(sampled_read(vk::PipelineStageFlags2::VERTEX_SHADER))
            .is_none());
        assert!(state
            .sync(sampled_read(vk::PipelineStageFlags2::FRAGMENT_SHADER))
            .is_none());

        let barrier = state
            .sync(transfer_write())
            .expect("write after reads must wait");
        assert_eq!(
            barrier.src_stages,
            vk::PipelineStageFlags2::VERTEX_SHADER | vk::PipelineStageFlags2::FRAGMENT_SHADER
        );
        assert_eq!(barrier.src_access, vk::AccessFlags2::SHADER_SAMPLED_READ);
        assert_eq!(barrier.old_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        assert_eq!(barrier.new_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    }

    #[test]
    fn layout_change_on_read_counts_as_write() {
        let mut state = ImageState::with_layout(
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            color_range(),
        );
        assert!(state
            .sync(sampled_read(vk::PipelineStageFlags2::FRAGMENT_SHADER))
            .is_none());

        let barrier = state
            .sync(ImageAccess {
                stages: vk::PipelineStageFlags2::TRANSFER,
                access: vk::AccessFlags2::TRANSFER_READ,
                layout: vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            })
            .expect("layout transition must wait on previous reads");
        assert_eq!(barrier.old_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        assert_eq!(barrier.new_layout, vk::ImageLayout::TRANSFER_SRC_OPTIMAL);
        assert_eq!(barrier.src_stages, vk::PipelineStageFlags2::FRAGMENT_SHADER);
        assert_eq!(state.sequence(), AccessSequence::Write);
    }

    #[test]
    fn write_after_write_chains_on_previous_write() {
        let mut state = ImageState::uninitialized(color_range());
        state.sync(transfer_write());

        let barrier = state
            .sync(ImageAccess {
                stages: vk::PipelineStageFlags2::COMPUTE_SHADER,
                access: vk::AccessFlags2::SHADER_STORAGE_WRITE,
                layout: vk::ImageLayout::GENERAL,
            })
            .expect("write after write must wait");
        assert_eq!(barrier.src_stages, vk::PipelineStageFlags2::TRANSFER);
        assert_eq!(barrier.src_access, vk::AccessFlags2::TRANSFER_WRITE);
        assert_eq!(barrier.old_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        assert_eq!(barrier.new_layout, vk::ImageLayout::GENERAL);
    }

    #[test]
    fn covered_read_after_write_is_elided() {
        let mut state = ImageState::uninitialized(color_range());
        state.sync(ImageAccess {
            stages: vk::PipelineStageFlags2::COMPUTE_SHADER,
            access: vk::AccessFlags2::SHADER_STORAGE_WRITE,
            layout: vk::ImageLayout::GENERAL,
        });

        let read = ImageAccess {
            stages: vk::PipelineStageFlags2::COMPUTE_SHADER,
            access: vk::AccessFlags2::SHADER_STORAGE_READ,
            layout: vk::ImageLayout::GENERAL,
        };
        let first = state.sync(read).expect("read after write must wait");
        assert_eq!(first.src_access, vk::AccessFlags2::SHADER_STORAGE_WRITE);
        assert_eq!(first.src_stages, vk::PipelineStageFlags2::COMPUTE_SHADER);

        //same scope again: the recorded barrier already covers it
        assert!(state.sync(read).is_none());

        //a distinct stage is not covered and waits on the write again
        let second = state
            .sync(ImageAccess {
                stages: vk::PipelineStageFlags2::FRAGMENT_SHADER,
                access: vk::AccessFlags2::SHADER_STORAGE_READ,
                layout: vk::ImageLayout::GENERAL,
            })
            .expect("uncovered read must wait on the write");
        assert_eq!(second.src_access, vk::AccessFlags2::SHADER_STORAGE_WRITE);

        //the next writer waits on the widened read set
        let writer = state
            .sync(ImageAccess {
                stages: vk::PipelineStageFlags2::TRANSFER,
                access: vk::AccessFlags2::TRANSFER_WRITE,
                layout: vk::ImageLayout::GENERAL,
            })
            .expect("write after reads must wait");
        assert_eq!(
            writer.src_stages,
            vk::PipelineStageFlags2::COMPUTE_SHADER | vk::PipelineStageFlags2::FRAGMENT_SHADER
        );
    }

    #[test]
    fn buffer_first_access_needs_no_barrier() {
        let mut state = BufferState::new();
        assert!(state
            .sync(BufferAccess {
                stages: vk::PipelineStageFlags2::TRANSFER,
                access: vk::AccessFlags2::TRANSFER_WRITE,
            })
            .is_none());
        assert_eq!(state.sequence(), AccessSequence::Write);
    }

    #[test]
    fn buffer_reads_merge_then_write_waits_on_union() {
        let mut state = BufferState::new();
        assert!(state
            .sync(BufferAccess {
                stages: vk::PipelineStageFlags2::VERTEX_INPUT,
                access: vk::AccessFlags2::VERTEX_ATTRIBUTE_READ,
            })
            .is_none());
        assert!(state
            .sync(BufferAccess {
                stages: vk::PipelineStageFlags2::COMPUTE_SHADER,
                access: vk::AccessFlags2::SHADER_STORAGE_READ,
            })
            .is_none());

        let barrier = state
            .sync(BufferAccess {
                stages: vk::PipelineStageFlags2::TRANSFER,
                access: vk::AccessFlags2::TRANSFER_WRITE,
            })
            .expect("write after reads must wait");
        assert_eq!(
            barrier.src_stages,
            vk::PipelineStageFlags2::VERTEX_INPUT | vk::PipelineStageFlags2::COMPUTE_SHADER
        );
        assert_eq!(
            barrier.src_access,
            vk::AccessFlags2::VERTEX_ATTRIBUTE_READ | vk::AccessFlags2::SHADER_STORAGE_READ
        );
        assert_eq!(barrier.offset, 0);
        assert_eq!(barrier.size, vk::WHOLE_SIZE);
    }

    #[test]
    fn buffer_read_after_write_dedups_covered_scope() {
        let mut state = BufferState::new();
        state.sync(BufferAccess {
            stages: vk::PipelineStageFlags2::TRANSFER,
            access: vk::AccessFlags2::TRANSFER_WRITE,
        });

        let read = BufferAccess {
            stages: vk::PipelineStageFlags2::VERTEX_INPUT,
            access: vk::AccessFlags2::VERTEX_ATTRIBUTE_READ,
        };
        assert!(state.sync(read).is_some());
        assert!(state.sync(read).is_none());
        assert_eq!(state.sequence(), AccessSequence::ReadAfterWrite);
    }

    #[test]
    fn impl_send_sync() {
        assert_impl_all!(ImageState: Send, Sync);
        assert_impl_all!(BufferState: Send, Sync);
        assert_impl_all!(ImageAccess: Send, Sync);
        assert_impl_all!(BufferAccess: Send, Sync);
    }
}
