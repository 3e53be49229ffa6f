/// Static description of a segmentation model the service knows how to feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelVariant {
    pub name: &'static str,
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

const VARIANTS: &[ModelVariant] = &[
    ModelVariant {
        name: "u2net",
        input_size: 320,
        mean: IMAGENET_MEAN,
        std: IMAGENET_STD,
    },
    ModelVariant {
        name: "u2netp",
        input_size: 320,
        mean: IMAGENET_MEAN,
        std: IMAGENET_STD,
    },
    ModelVariant {
        name: "u2net_human_seg",
        input_size: 320,
        mean: IMAGENET_MEAN,
        std: IMAGENET_STD,
    },
    ModelVariant {
        name: "silueta",
        input_size: 320,
        mean: IMAGENET_MEAN,
        std: IMAGENET_STD,
    },
    ModelVariant {
        name: "isnet-general-use",
        input_size: 1024,
        mean: [0.5, 0.5, 0.5],
        std: [1.0, 1.0, 1.0],
    },
];

pub fn available_variants() -> Vec<&'static str> {
    VARIANTS.iter().map(|v| v.name).collect()
}

pub fn find_variant(name: &str) -> Option<&'static ModelVariant> {
    VARIANTS.iter().find(|v| v.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_variant() {
        let variant = find_variant("u2net").unwrap();
        assert_eq!(variant.input_size, 320);
        assert_eq!(variant.mean, IMAGENET_MEAN);
    }

    #[test]
    fn test_unknown_variant() {
        assert!(find_variant("not-a-model").is_none());
        assert!(available_variants().contains(&"isnet-general-use"));
    }
}
