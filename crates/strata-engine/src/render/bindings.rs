use crate::device::{AttributePointer, RenderDevice};
use crate::scene::{COLOR_OFFSET_FLOATS, FLOATS_PER_VERTEX};

use super::RenderError;

/// Name of the position input in the vertex stage.
pub const POSITION_ATTRIBUTE: &str = "position";

/// Name of the color input in the vertex stage.
pub const COLOR_ATTRIBUTE: &str = "color";

/// Attribute slots resolved from a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributeBindings {
    pub position: u32,
    pub color: u32,
}

impl AttributeBindings {
    /// Looks up both attributes on `program`.
    pub fn resolve<D: RenderDevice>(device: &D, program: &D::Program) -> Result<Self, RenderError> {
        let lookup = |name: &'static str| {
            device
                .attribute_location(program, name)
                .ok_or(RenderError::MissingAttribute(name))
        };

        Ok(Self {
            position: lookup(POSITION_ATTRIBUTE)?,
            color: lookup(COLOR_ATTRIBUTE)?,
        })
    }

    /// Slot for a logical attribute name.
    pub fn get(&self, name: &str) -> Option<u32> {
        match name {
            POSITION_ATTRIBUTE => Some(self.position),
            COLOR_ATTRIBUTE => Some(self.color),
            _ => None,
        }
    }

    /// Pointers into one interleaved vertex buffer, in configuration order:
    /// position (3 floats at 0), then color (4 floats at 3), stride 7 floats.
    pub fn pointers(&self) -> [AttributePointer; 2] {
        let stride = FLOATS_PER_VERTEX as u64;
        [
            AttributePointer::floats(self.position, 3, stride, 0),
            AttributePointer::floats(self.color, 4, stride, COLOR_OFFSET_FLOATS as u64),
        ]
    }
}
