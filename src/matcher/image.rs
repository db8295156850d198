use super::cache::{augmented, image_identity, CacheReceptacle, Slot};
use super::SectionSet;
use crate::augment::build_image;
use crate::error::Result;
use crate::objects::Image;
use crate::policy::Policy;
use crate::violations::Violations;

/// Matches images at build time. Images are small, so there is no prefilter.
#[derive(Debug)]
pub struct ImageMatcher {
    sections: SectionSet,
}

impl ImageMatcher {
    pub(crate) fn new(sections: SectionSet) -> Self {
        Self { sections }
    }

    pub fn policy(&self) -> &Policy {
        self.sections.policy()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn match_image(
        &self,
        cache: Option<&mut CacheReceptacle>,
        image: &Image,
    ) -> Result<Violations> {
        let obj = augmented(cache, Slot::Image, &image_identity(image), || Ok(build_image(image)))?;
        self.sections.evaluate(&obj, None)
    }
}
