use ash::vk;

///Union of every access flag that reads memory. Includes the common extension
/// bits so that extension-heavy renderers classify correctly as well.
pub const READ_ACCESSES: vk::AccessFlags2 = vk::AccessFlags2::from_raw(
    vk::AccessFlags2::INDIRECT_COMMAND_READ.as_raw()
        | vk::AccessFlags2::INDEX_READ.as_raw()
        | vk::AccessFlags2::VERTEX_ATTRIBUTE_READ.as_raw()
        | vk::AccessFlags2::UNIFORM_READ.as_raw()
        | vk::AccessFlags2::INPUT_ATTACHMENT_READ.as_raw()
        | vk::AccessFlags2::SHADER_READ.as_raw()
        | vk::AccessFlags2::SHADER_SAMPLED_READ.as_raw()
        | vk::AccessFlags2::SHADER_STORAGE_READ.as_raw()
        | vk::AccessFlags2::COLOR_ATTACHMENT_READ.as_raw()
        | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ.as_raw()
        | vk::AccessFlags2::TRANSFER_READ.as_raw()
        | vk::AccessFlags2::HOST_READ.as_raw()
        | vk::AccessFlags2::MEMORY_READ.as_raw()
        | vk::AccessFlags2::TRANSFORM_FEEDBACK_COUNTER_READ_EXT.as_raw()
        | vk::AccessFlags2::CONDITIONAL_RENDERING_READ_EXT.as_raw()
        | vk::AccessFlags2::COLOR_ATTACHMENT_READ_NONCOHERENT_EXT.as_raw()
        | vk::AccessFlags2::ACCELERATION_STRUCTURE_READ_KHR.as_raw()
        | vk::AccessFlags2::FRAGMENT_DENSITY_MAP_READ_EXT.as_raw()
        | vk::AccessFlags2::FRAGMENT_SHADING_RATE_ATTACHMENT_READ_KHR.as_raw()
        | vk::AccessFlags2::COMMAND_PREPROCESS_READ_NV.as_raw(),
);

///Union of every access flag that writes memory.
pub const WRITE_ACCESSES: vk::AccessFlags2 = vk::AccessFlags2::from_raw(
    vk::AccessFlags2::SHADER_WRITE.as_raw()
        | vk::AccessFlags2::SHADER_STORAGE_WRITE.as_raw()
        | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE.as_raw()
        | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE.as_raw()
        | vk::AccessFlags2::TRANSFER_WRITE.as_raw()
        | vk::AccessFlags2::HOST_WRITE.as_raw()
        | vk::AccessFlags2::MEMORY_WRITE.as_raw()
        | vk::AccessFlags2::TRANSFORM_FEEDBACK_WRITE_EXT.as_raw()
        | vk::AccessFlags2::TRANSFORM_FEEDBACK_COUNTER_WRITE_EXT.as_raw()
        | vk::AccessFlags2::ACCELERATION_STRUCTURE_WRITE_KHR.as_raw()
        | vk::AccessFlags2::COMMAND_PREPROCESS_WRITE_NV.as_raw(),
);

///Returns true if any bit of `access` reads memory.
pub const fn is_read_access(access: vk::AccessFlags2) -> bool {
    access.intersects(READ_ACCESSES)
}

///Returns true if any bit of `access` writes memory.
pub const fn is_write_access(access: vk::AccessFlags2) -> bool {
    access.intersects(WRITE_ACCESSES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_reads() {
        assert!(is_read_access(vk::AccessFlags2::TRANSFER_READ));
        assert!(is_read_access(vk::AccessFlags2::SHADER_SAMPLED_READ));
        assert!(is_read_access(vk::AccessFlags2::MEMORY_READ));
        assert!(!is_write_access(vk::AccessFlags2::TRANSFER_READ));
        assert!(!is_write_access(vk::AccessFlags2::UNIFORM_READ));
    }

    #[test]
    fn classifies_writes() {
        assert!(is_write_access(vk::AccessFlags2::TRANSFER_WRITE));
        assert!(is_write_access(vk::AccessFlags2::COLOR_ATTACHMENT_WRITE));
        assert!(!is_read_access(vk::AccessFlags2::SHADER_STORAGE_WRITE));
    }

    #[test]
    fn mixed_masks_classify_as_both() {
        let mask = vk::AccessFlags2::SHADER_STORAGE_READ | vk::AccessFlags2::SHADER_STORAGE_WRITE;
        assert!(is_read_access(mask));
        assert!(is_write_access(mask));
    }

    #[test]
    fn none_is_neither() {
        assert!(!is_read_access(vk::AccessFlags2::NONE));
        assert!(!is_write_access(vk::AccessFlags2::NONE));
    }
}
