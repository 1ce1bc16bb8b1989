//! In-page functions passed to [`RenderingSurface::evaluate`].
//!
//! Each source is a single JavaScript function expression taking one JSON
//! argument. They hold no site knowledge; selectors and field rules arrive as
//! data. [`StaticPage`] recognizes these exact constants and answers them
//! natively.
//!
//! [`RenderingSurface::evaluate`]: crate::surface::RenderingSurface::evaluate
//! [`StaticPage`]: crate::surface::StaticPage

/// Scrolls the window to the bottom of the document. Argument ignored.
pub const SCROLL_TO_BOTTOM: &str = r"() => {
  window.scrollTo(0, document.body.scrollHeight);
  return null;
}";

/// Number of elements matching `selector`, counted in the page so no element
/// handles cross the protocol.
///
/// Argument: `{ selector: string }`.
pub const COUNT_MATCHES: &str = r"({ selector }) => document.querySelectorAll(selector).length";

/// Index, within `document.querySelectorAll(selector)`, of the first visible,
/// enabled element whose text contains `text` (case-insensitive), or `-1`.
///
/// Argument: `{ selector: string, text: string | null }`.
pub const FIND_LOAD_MORE: &str = r#"({ selector, text }) => {
  const needle = (text || "").toLowerCase();
  const nodes = Array.from(document.querySelectorAll(selector));
  return nodes.findIndex((el) => {
    if (el.disabled || el.getAttribute("aria-disabled") === "true") return false;
    const style = window.getComputedStyle(el);
    if (style.display === "none" || style.visibility === "hidden") return false;
    const rect = el.getBoundingClientRect();
    if (rect.width === 0 || rect.height === 0) return false;
    const label = (el.innerText || el.textContent || "").toLowerCase();
    return !needle || label.includes(needle);
  });
}"#;

/// Interprets an [`ExtractionDescriptor`] against every current item
/// container.
///
/// Returns `[{ fields: { [name]: string | null }, text: string }]` in
/// document order. For each field rule the selectors are tried in order and
/// the first element yielding a non-empty value wins. `data:` attribute
/// values count as empty so lazy-load placeholders fall through to the next
/// attribute. A rule with a `textField` also records the winning element's
/// own text under that name.
///
/// [`ExtractionDescriptor`]: crate::descriptor::ExtractionDescriptor
pub const EXTRACT_ITEMS: &str = r#"(descriptor) => {
  const clean = (value) => (value == null ? "" : String(value)).trim();
  const read = (el, mode) => {
    if (mode.kind === "attribute") {
      for (const name of mode.names) {
        const value = clean(el.getAttribute(name));
        if (value && !value.startsWith("data:")) return value;
      }
      return "";
    }
    return clean(el.innerText || el.textContent);
  };
  const cards = Array.from(document.querySelectorAll(descriptor.itemSelector));
  return cards.map((card) => {
    const fields = {};
    for (const rule of descriptor.fields) {
      fields[rule.name] = null;
      if (rule.textField) fields[rule.textField] = null;
      for (const selector of rule.selectors) {
        const el = card.querySelector(selector);
        if (!el) continue;
        const value = read(el, rule.read);
        if (value) {
          fields[rule.name] = value;
          if (rule.textField) fields[rule.textField] = clean(el.innerText || el.textContent) || null;
          break;
        }
      }
    }
    return { fields, text: clean(card.innerText || card.textContent) };
  });
}"#;

/// Arrays of store-like objects reachable from the page's own `window`
/// globals, as plain JSON. An array qualifies when one of its objects has an
/// `address`, `addressLine1` or `city` key. DOM nodes and cycles are skipped
/// and the walk is bounded. Argument ignored.
pub const FIND_STORE_GLOBALS: &str = r#"() => {
  const isStore = (item) =>
    item && typeof item === "object" && !Array.isArray(item) &&
    ("address" in item || "addressLine1" in item || "city" in item);
  const seen = new WeakSet();
  const found = [];
  const stack = [];
  for (const key of Object.keys(window)) {
    try { stack.push(window[key]); } catch (_) {}
  }
  let budget = 50000;
  while (stack.length && budget-- > 0) {
    const current = stack.pop();
    if (!current || typeof current !== "object" || seen.has(current)) continue;
    if (current === window || current instanceof Node) continue;
    seen.add(current);
    let values;
    try {
      values = Array.isArray(current) ? current : Object.values(current);
    } catch (_) {
      continue;
    }
    if (Array.isArray(current) && current.some(isStore)) found.push(current);
    for (const value of values) {
      if (value && typeof value === "object") stack.push(value);
    }
  }
  const plain = (value) => {
    try { return JSON.parse(JSON.stringify(value)); } catch (_) { return null; }
  };
  return found.map(plain).filter(Array.isArray);
}"#;
