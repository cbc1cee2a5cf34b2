//! Page list parsing for command-line arguments.

/// Parse a page list like `1,3-5,2` into page numbers, keeping the order
/// given on the command line.
pub fn parse_page_list(spec: &str) -> anyhow::Result<Vec<u32>> {
    let mut pages = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            anyhow::bail!("empty entry in page list '{spec}'");
        }
        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid page number '{start}'"))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid page number '{end}'"))?;
            if start == 0 || end < start {
                anyhow::bail!("invalid page range '{part}'");
            }
            pages.extend(start..=end);
        } else {
            let page: u32 = part
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid page number '{part}'"))?;
            if page == 0 {
                anyhow::bail!("page numbers start at 1");
            }
            pages.push(page);
        }
    }
    if pages.is_empty() {
        anyhow::bail!("no pages given");
    }
    Ok(pages)
}

/// Parse a single `START-END` range.
pub fn parse_range(spec: &str) -> anyhow::Result<(u32, u32)> {
    let (start, end) = spec
        .split_once('-')
        .ok_or_else(|| anyhow::anyhow!("expected START-END, got '{spec}'"))?;
    let start: u32 = start.trim().parse()?;
    let end: u32 = end.trim().parse()?;
    if start == 0 || end < start {
        anyhow::bail!("invalid page range '{spec}'");
    }
    Ok((start, end))
}
