use ndarray::Array2;

/// A single grayscale image plane.
/// Pixel values are f32 in [0.0, 1.0].
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Original bit depth before conversion (8 or 16)
    pub original_bit_depth: u8,
}

impl Frame {
    pub fn new(data: Array2<f32>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

/// Color image composed of separate channel frames.
#[derive(Clone, Debug)]
pub struct ColorFrame {
    pub red: Frame,
    pub green: Frame,
    pub blue: Frame,
}

/// A decoded input frame, mono or color.
///
/// Everything after registration (stacking, sharpening, output) operates on
/// this type so that color sources keep their channels through the pipeline.
#[derive(Clone, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Image {
    Mono(Frame),
    Color(ColorFrame),
}

impl Image {
    pub fn width(&self) -> usize {
        match self {
            Self::Mono(f) => f.width(),
            Self::Color(cf) => cf.red.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::Mono(f) => f.height(),
            Self::Color(cf) => cf.red.height(),
        }
    }

    pub fn bit_depth(&self) -> u8 {
        match self {
            Self::Mono(f) => f.original_bit_depth,
            Self::Color(cf) => cf.red.original_bit_depth,
        }
    }

    /// True when both images have the same variant and spatial dimensions.
    pub fn same_shape(&self, other: &Image) -> bool {
        let variant_matches = matches!(
            (self, other),
            (Self::Mono(_), Self::Mono(_)) | (Self::Color(_), Self::Color(_))
        );
        variant_matches && self.width() == other.width() && self.height() == other.height()
    }

    /// Apply a per-plane transformation, preserving the mono/color variant.
    pub fn map_planes<F>(&self, mut op: F) -> Image
    where
        F: FnMut(&Frame) -> Frame,
    {
        match self {
            Self::Mono(f) => Self::Mono(op(f)),
            Self::Color(cf) => Self::Color(ColorFrame {
                red: op(&cf.red),
                green: op(&cf.green),
                blue: op(&cf.blue),
            }),
        }
    }
}
