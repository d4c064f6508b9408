//! Selection hierarchy discovery.
//!
//! A product line's selection page lists tiles. Clicking a tile either opens
//! a sub-variant menu of links, navigates straight to the item's preview, or
//! does nothing useful. Each tile is resolved by index against the live page.

use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::BrowserSession;
use crate::config::{Config, Selectors, Timeouts};
use crate::error::{AcquireError, AcquireResult};
use crate::models::{IdScheme, ProductLine, SelectionEntry};

/// Extracts `{text, href}` for every link in the open sub-variant menu.
pub(crate) const MENU_LINKS_SCRIPT: &str = r#"
(linkSelector) =>
    Array.from(document.querySelectorAll(linkSelector)).map((link) => ({
        text: link.textContent,
        href: link.getAttribute('href'),
    }))
"#;

/// What clicking a tile led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A sub-variant menu opened; one entry per link carrying an identifier.
    Menu(Vec<SelectionEntry>),
    /// The page navigated to a preview carrying the identifier and name.
    DirectNavigation(SelectionEntry),
    /// No menu and no usable navigation.
    Neither,
}

impl ClickOutcome {
    pub fn into_entries(self) -> Vec<SelectionEntry> {
        match self {
            ClickOutcome::Menu(entries) => entries,
            ClickOutcome::DirectNavigation(entry) => vec![entry],
            ClickOutcome::Neither => Vec::new(),
        }
    }
}

/// Click the cookie-consent button if it shows up. Absence is not an error.
pub async fn dismiss_cookie_banner<B>(
    session: &mut B,
    selectors: &Selectors,
    timeouts: &Timeouts,
) -> AcquireResult<bool>
where
    B: BrowserSession + ?Sized,
{
    if !session
        .wait_for_selector(&selectors.cookie_accept, timeouts.cookie_banner())
        .await?
    {
        return Ok(false);
    }
    let clicked = session.click_at(&selectors.cookie_accept, 0).await?;
    if clicked {
        debug!("Dismissed cookie banner");
    }
    Ok(clicked)
}

/// Enumerate every concrete item on the selection page the session is on.
///
/// The tile count is read once; tiles are then re-queried by index on every
/// iteration because navigating back replaces the live elements. An index
/// that no longer resolves yields nothing.
pub async fn discover_entries<B>(
    session: &mut B,
    line: &ProductLine,
    selection_url: &str,
    config: &Config,
) -> AcquireResult<Vec<SelectionEntry>>
where
    B: BrowserSession + ?Sized,
{
    let selectors = &config.selectors;
    if !session
        .wait_for_selector(&selectors.tile, config.timeouts.selection_page())
        .await?
    {
        return Err(AcquireError::ElementNotFound(format!(
            "{} on {}",
            selectors.tile, selection_url
        )));
    }

    let tile_count = session.count(&selectors.tile).await?;
    info!(line = %line.name, tiles = tile_count, "Discovering selection entries");

    let mut entries = Vec::new();
    for index in 0..tile_count {
        let label = match session.text_at(&selectors.tile, index).await? {
            Some(label) => label,
            None => {
                debug!(index, "Tile no longer present");
                continue;
            }
        };

        let before = session.current_url().await?;
        if !session.click_at(&selectors.tile, index).await? {
            debug!(index, "Tile vanished before click");
            continue;
        }

        let outcome = classify_click(session, line, selection_url, &before, config).await?;
        match &outcome {
            ClickOutcome::Menu(found) => {
                debug!(tile = %label.trim(), variants = found.len(), "Tile opened menu")
            }
            ClickOutcome::DirectNavigation(entry) => {
                debug!(tile = %label.trim(), id = %entry.identifier, "Tile navigated to preview")
            }
            ClickOutcome::Neither => debug!(tile = %label.trim(), "Tile produced nothing"),
        }
        entries.extend(outcome.into_entries());
    }

    info!(line = %line.name, entries = entries.len(), "Selection discovery complete");
    Ok(entries)
}

/// Resolve what the click that just happened did.
///
/// A menu is waited for briefly first; if none appears the click is assumed
/// to have started a navigation, which must settle within its own bound.
async fn classify_click<B>(
    session: &mut B,
    line: &ProductLine,
    selection_url: &str,
    url_before_click: &str,
    config: &Config,
) -> AcquireResult<ClickOutcome>
where
    B: BrowserSession + ?Sized,
{
    let selectors = &config.selectors;
    let timeouts = &config.timeouts;
    let scheme = line.id_scheme();

    if session
        .wait_for_selector(&selectors.menu, timeouts.menu_wait())
        .await?
    {
        let entries = read_menu_entries(session, &selectors.menu_link, scheme).await?;
        session.press_key("Escape").await?;
        tokio::time::sleep(timeouts.menu_settle()).await;
        return Ok(ClickOutcome::Menu(entries));
    }

    if !session
        .wait_for_navigation(timeouts.tile_navigation())
        .await?
    {
        return Err(AcquireError::timeout(
            "navigation after tile click",
            timeouts.tile_navigation(),
        ));
    }

    let landed = session.current_url().await?;
    if landed == url_before_click {
        return Ok(ClickOutcome::Neither);
    }

    let entry = SelectionEntry::from_preview_url(&landed, scheme);
    if entry.is_none() {
        warn!(url = %landed, "Tile navigated to a page without an identifier and name");
    }

    return_to_selection(session, selection_url, config).await?;

    Ok(entry
        .map(ClickOutcome::DirectNavigation)
        .unwrap_or(ClickOutcome::Neither))
}

async fn read_menu_entries<B>(
    session: &mut B,
    link_selector: &str,
    scheme: IdScheme,
) -> AcquireResult<Vec<SelectionEntry>>
where
    B: BrowserSession + ?Sized,
{
    let base_url = session.current_url().await?;
    let base = Url::parse(&base_url)
        .map_err(|e| AcquireError::Browser(format!("invalid page URL {}: {}", base_url, e)))?;

    let links = session
        .evaluate(MENU_LINKS_SCRIPT, vec![Value::from(link_selector)])
        .await?;
    let links = links.as_array().cloned().unwrap_or_default();

    let entries: Vec<SelectionEntry> = links
        .iter()
        .filter_map(|link| {
            let href = link.get("href")?.as_str()?;
            let text = link.get("text").and_then(|t| t.as_str()).unwrap_or("");
            SelectionEntry::from_menu_link(text, href, &base, scheme)
        })
        .collect();

    if entries.len() < links.len() {
        debug!(
            "Discarded {} menu links without {}",
            links.len() - entries.len(),
            scheme.id_param()
        );
    }
    Ok(entries)
}

/// Go back to the selection page, reloading it if history does not restore
/// the tile list.
async fn return_to_selection<B>(
    session: &mut B,
    selection_url: &str,
    config: &Config,
) -> AcquireResult<()>
where
    B: BrowserSession + ?Sized,
{
    let selectors = &config.selectors;
    let timeouts = &config.timeouts;

    session.go_back(timeouts.tile_navigation()).await?;
    if session
        .wait_for_selector(&selectors.tile, timeouts.selection_page())
        .await?
    {
        return Ok(());
    }

    warn!(url = %selection_url, "Tiles missing after going back, reloading selection page");
    session
        .navigate(selection_url, timeouts.selection_page())
        .await?;
    if session
        .wait_for_selector(&selectors.tile, timeouts.selection_page())
        .await?
    {
        Ok(())
    } else {
        Err(AcquireError::ElementNotFound(format!(
            "{} on {}",
            selectors.tile, selection_url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::testing::{test_config, SELECTION_URL};
    use crate::browser::fake::{FakeSession, FakeSite, FakeTile};

    fn line() -> ProductLine {
        ProductLine::numbered("Grimdark Future Firefight", 3, "3")
    }

    fn site_with(tiles: Vec<FakeTile>) -> (FakeSite, Config) {
        let config = test_config();
        let mut site = FakeSite::with_selectors(config.selectors.clone());
        site.selection_pages.insert(SELECTION_URL.to_string(), tiles);
        (site, config)
    }

    async fn open(site: FakeSite, config: &Config) -> FakeSession {
        let mut session = FakeSession::new(site);
        session
            .navigate(SELECTION_URL, config.timeouts.selection_page())
            .await
            .unwrap();
        session
    }

    async fn session_with(tiles: Vec<FakeTile>) -> (FakeSession, Config) {
        let (site, config) = site_with(tiles);
        let session = open(site, &config).await;
        (session, config)
    }

    fn navigate_tile(name: &str, id: &str) -> FakeTile {
        FakeTile::Navigate {
            label: name.to_string(),
            url: format!("https://site.test/preview?armyId={}&armyName={}", id, name),
        }
    }

    #[tokio::test]
    async fn test_menu_keeps_only_links_with_identifier() {
        let (mut session, config) = session_with(vec![FakeTile::Menu {
            label: "Orcs".into(),
            links: vec![
                ("Orc Marauders".into(), "/preview?armyId=1&armyName=Marauders".into()),
                ("Orc Warband".into(), "https://site.test/preview?armyId=2".into()),
                ("".into(), "/preview?armyId=3&armyName=Raiders".into()),
                ("Broken".into(), "/preview?armyName=NoId".into()),
            ],
        }])
        .await;

        let entries = discover_entries(&mut session, &line(), SELECTION_URL, &config)
            .await
            .unwrap();

        assert_eq!(
            entries,
            vec![
                SelectionEntry::new("Orc Marauders", "1"),
                SelectionEntry::new("Orc Warband", "2"),
                SelectionEntry::new("Raiders", "3"),
            ]
        );
        assert_eq!(session.keys, vec!["Escape".to_string()]);
        assert!(!session.menu_open());
    }

    #[tokio::test]
    async fn test_direct_navigation_yields_single_entry() {
        let (mut session, config) = session_with(vec![FakeTile::Navigate {
            label: "Orcs".into(),
            url: "https://site.test/preview?armyId=42&armyName=Orcs".into(),
        }])
        .await;

        let entries = discover_entries(&mut session, &line(), SELECTION_URL, &config)
            .await
            .unwrap();

        assert_eq!(entries, vec![SelectionEntry::new("Orcs", "42")]);
        assert_eq!(session.current_url().await.unwrap(), SELECTION_URL);
    }

    #[tokio::test]
    async fn test_fleet_line_reads_alternate_params() {
        let (mut session, config) = session_with(vec![FakeTile::Navigate {
            label: "Wolves".into(),
            url: "https://site.test/preview?fleetId=7&fleetName=Wolves".into(),
        }])
        .await;
        let fleet = ProductLine::fixed("Warfleets", SELECTION_URL, "ftl");

        let entries = discover_entries(&mut session, &fleet, SELECTION_URL, &config)
            .await
            .unwrap();
        assert_eq!(entries, vec![SelectionEntry::new("Wolves", "7")]);
    }

    #[tokio::test]
    async fn test_mixed_tiles_in_page_order() {
        let (mut session, config) = session_with(vec![
            FakeTile::Inert {
                label: "Coming soon".into(),
            },
            FakeTile::Navigate {
                label: "Orcs".into(),
                url: "https://site.test/preview?armyId=42&armyName=Orcs".into(),
            },
            FakeTile::Navigate {
                label: "Unnamed".into(),
                url: "https://site.test/preview?armyId=43".into(),
            },
            FakeTile::Menu {
                label: "Elves".into(),
                links: vec![("High Elves".into(), "/preview?armyId=50".into())],
            },
        ])
        .await;

        let entries = discover_entries(&mut session, &line(), SELECTION_URL, &config)
            .await
            .unwrap();
        assert_eq!(
            entries,
            vec![
                SelectionEntry::new("Orcs", "42"),
                SelectionEntry::new("High Elves", "50"),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_tile_list_is_an_error() {
        let (mut session, config) = session_with(Vec::new()).await;
        let err = discover_entries(&mut session, &line(), SELECTION_URL, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::ElementNotFound(_)));
    }

    #[tokio::test]
    async fn test_cookie_banner_is_optional() {
        let config = test_config();
        let mut site = FakeSite::with_selectors(config.selectors.clone());
        site.cookie_banner = true;
        let mut session = FakeSession::new(site);

        assert!(dismiss_cookie_banner(&mut session, &config.selectors, &config.timeouts)
            .await
            .unwrap());
        assert!(!dismiss_cookie_banner(&mut session, &config.selectors, &config.timeouts)
            .await
            .unwrap());
        assert_eq!(session.cookie_dismissals, 1);
    }

    #[tokio::test]
    async fn test_tiles_missing_after_back_yield_nothing() {
        let (mut site, config) = site_with(vec![
            navigate_tile("Orcs", "42"),
            navigate_tile("Elves", "7"),
            navigate_tile("Dwarves", "9"),
        ]);
        site.tiles_after_back = Some(vec![navigate_tile("Orcs", "42")]);
        let mut session = open(site, &config).await;

        let entries = discover_entries(&mut session, &line(), SELECTION_URL, &config)
            .await
            .unwrap();

        assert_eq!(entries, vec![SelectionEntry::new("Orcs", "42")]);
        assert_eq!(session.current_url().await.unwrap(), SELECTION_URL);
    }

    #[tokio::test]
    async fn test_stalled_tile_navigation_times_out() {
        let (mut site, config) = site_with(vec![FakeTile::Inert {
            label: "Loading".into(),
        }]);
        site.navigation_stalls = true;
        let mut session = open(site, &config).await;

        let err = discover_entries(&mut session, &line(), SELECTION_URL, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::NavigationTimeout { .. }));
    }

    #[tokio::test]
    async fn test_reloads_selection_page_when_back_loses_tiles() {
        let (mut site, config) = site_with(vec![
            navigate_tile("Orcs", "42"),
            navigate_tile("Elves", "7"),
        ]);
        site.back_loses_tiles = true;
        let mut session = open(site, &config).await;

        let entries = discover_entries(&mut session, &line(), SELECTION_URL, &config)
            .await
            .unwrap();

        assert_eq!(
            entries,
            vec![SelectionEntry::new("Orcs", "42"), SelectionEntry::new("Elves", "7")]
        );
        let loads = session
            .navigations
            .iter()
            .filter(|u| u.as_str() == SELECTION_URL)
            .count();
        assert_eq!(loads, 3);
    }

    #[tokio::test]
    async fn test_tiles_missing_after_reload_is_an_error() {
        let (mut site, config) = site_with(vec![navigate_tile("Orcs", "42")]);
        site.tiles_after_back = Some(Vec::new());
        let mut session = open(site, &config).await;

        let err = discover_entries(&mut session, &line(), SELECTION_URL, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::ElementNotFound(_)));
    }
}
