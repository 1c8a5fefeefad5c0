//! Visible region calculation
//!
//! Given the viewport of a scroll container and an ordered list of laid-out
//! views, determines which views currently intersect the viewport and how
//! much of each is showing. Views must be ordered top to bottom; the first
//! candidate is found with a binary search so long documents stay cheap.

use std::rc::Rc;

/// Visible rectangle of a scroll container, in content coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollViewport {
    /// Scroll offset from the top of the content
    pub top: f32,

    /// Scroll offset from the left of the content
    pub left: f32,

    /// Visible width
    pub width: f32,

    /// Visible height
    pub height: f32,
}

impl ScrollViewport {
    /// Create a new viewport
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Bottom edge in content coordinates
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Right edge in content coordinates
    pub fn right(&self) -> f32 {
        self.left + self.width
    }
}

/// Layout box of a view inside the scroll content
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ElementBounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// A view that can take part in visibility calculation
pub trait VisibleElement {
    /// Stable identifier (page number for page-backed views)
    fn id(&self) -> u32;

    /// Current layout box
    fn bounds(&self) -> ElementBounds;
}

impl<T: VisibleElement + ?Sized> VisibleElement for Rc<T> {
    fn id(&self) -> u32 {
        (**self).id()
    }

    fn bounds(&self) -> ElementBounds {
        (**self).bounds()
    }
}

/// One visible view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleView {
    /// View identifier
    pub id: u32,

    /// Position of the view in the list passed to `get_visible_elements`
    pub index: usize,

    /// Left edge of the view
    pub x: f32,

    /// Top edge of the view
    pub y: f32,

    /// Visible share of the view's height, 0-100
    pub percent: u32,
}

/// Result of a visibility pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleViews {
    /// Visible views, in list order unless sorted by visibility
    pub views: Vec<VisibleView>,
    first: Option<VisibleView>,
    last: Option<VisibleView>,
}

impl VisibleViews {
    /// Topmost visible view
    pub fn first(&self) -> Option<&VisibleView> {
        self.first.as_ref()
    }

    /// Bottommost visible view
    pub fn last(&self) -> Option<&VisibleView> {
        self.last.as_ref()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Check whether the view with `id` is visible
    pub fn contains(&self, id: u32) -> bool {
        self.views.iter().any(|view| view.id == id)
    }
}

/// Compute the views intersecting `viewport`
///
/// `first` and `last` always refer to document order, even when
/// `sort_by_visibility` reorders `views` by visible percentage (most visible
/// first, ties broken by ascending id).
pub fn get_visible_elements<V: VisibleElement>(
    viewport: &ScrollViewport,
    views: &[V],
    sort_by_visibility: bool,
) -> VisibleViews {
    let top = viewport.top;
    let bottom = viewport.bottom();
    let left = viewport.left;
    let right = viewport.right();

    let first_index = views.partition_point(|view| view.bounds().bottom() <= top);

    let mut visible = Vec::new();
    for (index, view) in views.iter().enumerate().skip(first_index) {
        let bounds = view.bounds();
        if bounds.y > bottom {
            break;
        }

        if bounds.right() < left || bounds.x > right {
            continue;
        }

        let hidden = (top - bounds.y).max(0.0) + (bounds.bottom() - bottom).max(0.0);
        let percent = if bounds.height > 0.0 {
            (((bounds.height - hidden) * 100.0) / bounds.height).max(0.0) as u32
        } else {
            0
        };

        visible.push(VisibleView {
            id: view.id(),
            index,
            x: bounds.x,
            y: bounds.y,
            percent,
        });
    }

    let first = visible.first().copied();
    let last = visible.last().copied();

    if sort_by_visibility {
        visible.sort_by(|a, b| b.percent.cmp(&a.percent).then(a.id.cmp(&b.id)));
    }

    VisibleViews {
        views: visible,
        first,
        last,
    }
}
