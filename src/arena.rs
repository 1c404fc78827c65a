use std::ops::Deref;

use crate::color::Color;
use crate::error::Error;
use crate::image::Image;

/// Handle to an image stored in an [`ImageArena`].
///
/// Handles of destroyed images stay invalid even if the slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    index: usize,
    generation: u32,
}

/// Mutable access to an image stored in an [`ImageArena`].
///
/// Backgrounds can only be changed through [`ImageArena::set_background`],
/// which keeps the handles of replaced backgrounds invalid.
///
/// ```compile_fail
/// use liquant::{Attr, Image, ImageArena};
///
/// let attr = Attr::new();
/// let mut arena = ImageArena::new();
/// let owner = arena.insert(Image::new_owned(&attr, vec![0; 4], 1, 1, 0.0).unwrap());
/// let other = Image::new_owned(&attr, vec![0; 4], 1, 1, 0.0).unwrap();
///
/// arena.get_mut(owner).unwrap().set_background(other).unwrap();
/// ```
pub struct ImageMut<'a, 'pixels> {
    image: &'a mut Image<'pixels>,
}

impl<'pixels> ImageMut<'_, 'pixels> {
    /// See [`Image::set_importance_map`]
    pub fn set_importance_map(&mut self, map: &[u8]) -> Result<(), Error> {
        self.image.set_importance_map(map)
    }

    /// See [`Image::add_fixed_color`]
    pub fn add_fixed_color(&mut self, color: Color) -> Result<(), Error> {
        self.image.add_fixed_color(color)
    }
}

impl<'pixels> Deref for ImageMut<'_, 'pixels> {
    type Target = Image<'pixels>;

    fn deref(&self) -> &Self::Target {
        self.image
    }
}

enum Slot<'pixels> {
    Live(Image<'pixels>),
    /// Moved into the image at slot `owner` as its background
    Background { owner: usize },
    Vacant,
}

struct Entry<'pixels> {
    generation: u32,
    slot: Slot<'pixels>,
}

/// Handle-based image storage for callers that destroy images explicitly.
///
/// An image assigned as another image's background is owned by that image:
/// destroying it directly is a no-op, and destroying the owner destroys the
/// background too.
#[derive(Default)]
pub struct ImageArena<'pixels> {
    entries: Vec<Entry<'pixels>>,
    free: Vec<usize>,
}

impl<'pixels> ImageArena<'pixels> {
    pub fn new() -> Self {
        Self {
            entries: vec![],
            free: vec![],
        }
    }

    pub fn insert(&mut self, image: Image<'pixels>) -> ImageHandle {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index];
            entry.slot = Slot::Live(image);

            return ImageHandle { index, generation: entry.generation };
        }

        self.entries.push(Entry { generation: 0, slot: Slot::Live(image) });

        ImageHandle { index: self.entries.len() - 1, generation: 0 }
    }

    /// Number of images that haven't been destroyed, backgrounds included
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !matches!(e.slot, Slot::Vacant)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, handle: ImageHandle) -> Result<&Image<'pixels>, Error> {
        self.check(handle)?;
        self.resolve(handle.index).ok_or(Error::InvalidPointer)
    }

    pub fn get_mut(&mut self, handle: ImageHandle) -> Result<ImageMut<'_, 'pixels>, Error> {
        self.check(handle)?;
        let image = self.resolve_mut(handle.index).ok_or(Error::InvalidPointer)?;

        Ok(ImageMut { image })
    }

    pub fn is_background(&self, handle: ImageHandle) -> Result<bool, Error> {
        self.check(handle)?;

        Ok(matches!(self.entries[handle.index].slot, Slot::Background { .. }))
    }

    /// Moves `background` into `owner`.
    ///
    /// Returns [`Error::BufferTooSmall`] if the dimensions differ, in which
    /// case both images are left as they were. A background the owner had
    /// before is destroyed.
    pub fn set_background(&mut self, owner: ImageHandle, background: ImageHandle) -> Result<(), Error> {
        self.check(owner)?;
        self.check(background)?;

        if owner.index == background.index {
            return Err(Error::Unsupported);
        }

        let (Slot::Live(owner_img), Slot::Live(bg_img)) = (&self.entries[owner.index].slot, &self.entries[background.index].slot) else {
            // Nested backgrounds are only reachable through their owner
            return Err(Error::Unsupported);
        };

        if owner_img.width() != bg_img.width() || owner_img.height() != bg_img.height() {
            return Err(Error::BufferTooSmall);
        }

        let Slot::Live(bg_img) = std::mem::replace(&mut self.entries[background.index].slot, Slot::Background { owner: owner.index }) else {
            return Err(Error::InvalidPointer);
        };

        // The replaced background goes away with its subtree
        let previous: Vec<usize> = self.children(owner.index).into_iter().filter(|&i| i != background.index).collect();
        for index in previous {
            self.vacate(index);
        }

        match &mut self.entries[owner.index].slot {
            Slot::Live(owner_img) => owner_img.set_background(bg_img),
            _ => Err(Error::InvalidPointer),
        }
    }

    /// Destroys the image and its background.
    ///
    /// Destroying an image that is some other image's background does
    /// nothing, it lives as long as its owner.
    pub fn destroy(&mut self, handle: ImageHandle) -> Result<(), Error> {
        self.check(handle)?;

        match self.entries[handle.index].slot {
            Slot::Background { .. } => Ok(()),
            _ => {
                self.vacate(handle.index);
                Ok(())
            },
        }
    }

    fn check(&self, handle: ImageHandle) -> Result<(), Error> {
        match self.entries.get(handle.index) {
            Some(e) if e.generation == handle.generation && !matches!(e.slot, Slot::Vacant) => Ok(()),
            _ => Err(Error::InvalidPointer),
        }
    }

    fn children(&self, owner: usize) -> Vec<usize> {
        self.entries.iter().enumerate()
            .filter(|(_, e)| matches!(e.slot, Slot::Background { owner: o } if o == owner))
            .map(|(i, _)| i)
            .collect()
    }

    fn vacate(&mut self, index: usize) {
        for child in self.children(index) {
            self.vacate(child);
        }

        let entry = &mut self.entries[index];
        entry.slot = Slot::Vacant;
        entry.generation = entry.generation.wrapping_add(1);

        self.free.push(index);
    }

    fn resolve(&self, index: usize) -> Option<&Image<'pixels>> {
        match &self.entries.get(index)?.slot {
            Slot::Live(img) => Some(img),
            Slot::Background { owner } => self.resolve(*owner)?.background(),
            Slot::Vacant => None,
        }
    }

    fn resolve_mut(&mut self, index: usize) -> Option<&mut Image<'pixels>> {
        let owner = match &self.entries.get(index)?.slot {
            Slot::Live(_) => None,
            Slot::Background { owner } => Some(*owner),
            Slot::Vacant => return None,
        };

        match owner {
            Some(owner) => self.resolve_mut(owner)?.background_mut(),
            None => match &mut self.entries[index].slot {
                Slot::Live(img) => Some(img),
                _ => None,
            },
        }
    }
}
