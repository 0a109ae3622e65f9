//! End-to-end dataset build
//!
//! 1. Check the upstream version and refresh the cached exports if it moved.
//! 2. Merge the regional exports into servants and items.
//! 3. Cache images and fetch event/war details on the worker pool.
//! 4. Index event rewards and spreadsheet drops onto items.
//! 5. Write `dump.json`.

use crate::atlas::{AtlasEvent, AtlasGrailCosts, AtlasItem, AtlasServant, EventSummary, War};
use crate::converter::Converter;
use crate::events;
use crate::fetch::{read_json, write_json, Fetcher};
use crate::images::ImageCache;
use crate::range::convert_ranged_map;
use crate::sheets::{self, Spreadsheets};
use crate::tasks::TaskQueue;
use crate::webcrow;
use anyhow::{Context, Result};
use chrono::Utc;
use fgoplan::data::IdMap;
use fgoplan::{
    DataDump, EventId, GameEvent, GrailCost, GrailCosts, Item, ItemId, Servant, ServantId, WarId,
    GRAIL_ID, QP_ID,
};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Levels covered by the shared experience curve.
const EXP_CURVE_LEVELS: usize = 100;

/// Highest rarity with a grail schedule.
const MAX_RARITY: u32 = 5;

const SIMULATOR_SCRIPT_URL: &str = "http://fgosimulator.webcrow.jp/Material/js/fgos_material.min.js";

#[derive(Debug, Clone)]
pub struct Options {
    pub out_dir: PathBuf,
    pub api_base: String,
    pub sheets_key: Option<String>,
    pub skip_version_check: bool,
    pub skip_image_download: bool,
    pub workers: usize,
}

impl Options {
    fn path(&self, name: &str) -> PathBuf {
        self.out_dir.join(name)
    }

    fn event_path(&self, id: EventId) -> PathBuf {
        self.path(&format!("event_{}.json", id))
    }

    fn war_path(&self, id: WarId) -> PathBuf {
        self.path(&format!("war_{}.json", id))
    }
}

/// Decide which dataset version we are building and whether cached exports
/// are stale.
///
/// Returns the new version marker and whether it differs from the cached one.
pub fn check_version(
    cached: Option<&str>,
    skip_check: bool,
    fetch: impl FnOnce() -> Result<String>,
) -> Result<(String, bool)> {
    let version = if skip_check {
        cached.unwrap_or("Unknown").to_string()
    } else {
        fetch()?
    };
    let is_new = cached != Some(version.as_str());
    Ok((version, is_new))
}

fn fetch_exports(options: &Options, fetcher: &Fetcher) -> Result<()> {
    let version_path = options.path("version.json");
    let cached = fs::read_to_string(&version_path).ok();

    let api = &options.api_base;
    let (version, is_new) = check_version(cached.as_deref(), options.skip_version_check, || {
        fetcher.get_string(&format!("{}/info", api))
    })?;
    if is_new {
        info!("Upstream data changed, refreshing exports");
    }

    let exports = [
        ("export/JP/nice_servant_lang_en.json", "servants_jp.json"),
        ("export/NA/nice_servant.json", "servants_na.json"),
        ("export/JP/basic_event_lang_en.json", "events_jp.json"),
        ("export/NA/nice_item.json", "items_na.json"),
        ("export/NA/NiceSvtGrailCost.json", "grail_na.json"),
    ];
    for (export, file) in exports {
        fetcher.get_file(&format!("{}/{}", api, export), &options.path(file), is_new)?;
    }
    fetcher.get_file(SIMULATOR_SCRIPT_URL, &options.path("fgo_sim.js"), is_new)?;

    match &options.sheets_key {
        Some(key) => {
            let url = format!("{}&key={}", sheets::SPREADSHEET_URL, key);
            fetcher.get_file(&url, &options.path("drops.json"), is_new)?;
        }
        None => warn!("SHEETS_KEY environment variable not present, skipping drop download"),
    }

    fs::write(&version_path, version)
        .with_context(|| format!("Failed to write {}", version_path.display()))?;
    Ok(())
}

/// The shared experience curve, taken from the first servant.
pub fn exp_growth(servants: &[AtlasServant]) -> Vec<u64> {
    servants
        .first()
        .map(|x| x.exp_growth.iter().take(EXP_CURVE_LEVELS).copied().collect())
        .unwrap_or_default()
}

/// Dense grail schedules for rarities 0 to 5.
pub fn grail_costs(costs: &AtlasGrailCosts) -> Result<GrailCosts> {
    convert_ranged_map(costs, 0, MAX_RARITY, |tiers| {
        convert_ranged_map(tiers, 1, tiers.len() as u32, |tier| GrailCost {
            add: tier.add_lv_max,
            qp: tier.qp,
        })
    })
    .context("Grail costs")?
    .into_iter()
    .collect::<Result<Vec<_>>>()
    .context("Grail costs")
}

/// Merge both regional exports. QP and grails are registered first and must
/// exist.
pub fn convert(
    primary: &[AtlasServant],
    reference: &[AtlasServant],
    items: &[AtlasItem],
) -> Result<Converter> {
    let mut converter = Converter::new(exp_growth(primary), items);
    for id in [QP_ID, GRAIL_ID] {
        let item = items
            .iter()
            .find(|x| x.id == id)
            .with_context(|| format!("Item #{} is missing from the item export", id))?;
        converter.add_item(item, Some(true));
    }

    let reference: HashMap<_, _> = reference.iter().map(|x| (x.id, x)).collect();
    for servant in primary {
        converter.add_servant(servant, reference.get(&servant.id).copied())?;
    }
    Ok(converter)
}

fn servant_images(servant: &Servant) -> Vec<String> {
    let skills = servant.skills.iter().chain(&servant.append_skills).flatten();
    servant
        .ascensions
        .iter()
        .cloned()
        .chain(skills.map(|x| x.icon.clone()))
        .filter(|x| !x.is_empty())
        .collect()
}

/// Point every image reference at its materialized name.
fn rewrite_images(
    servants: &mut IdMap<ServantId, Servant>,
    items: &mut IdMap<ItemId, Item>,
    resolved: &HashMap<String, String>,
) {
    let rewrite = |url: &mut String| {
        if let Some(local) = resolved.get(url.as_str()) {
            url.clone_from(local);
        }
    };

    for servant in servants.values_mut() {
        servant.ascensions.iter_mut().for_each(rewrite);
        let skills = servant.skills.iter_mut().chain(servant.append_skills.iter_mut());
        for skill in skills.flatten() {
            rewrite(&mut skill.icon);
        }
    }
    for item in items.values_mut() {
        rewrite(&mut item.icon);
    }
}

/// Cache images and fetch the details of `recent` events and their wars.
fn run_tasks(
    options: &Options,
    fetcher: &Fetcher,
    servants: &mut IdMap<ServantId, Servant>,
    items: &mut IdMap<ItemId, Item>,
    recent: &[&EventSummary],
) -> Result<()> {
    let cache = ImageCache::new(&options.out_dir, options.skip_image_download, fetcher);
    let resolved = Mutex::new(HashMap::new());
    let seen_wars = Mutex::new(HashSet::new());

    let urls: Vec<Vec<String>> = servants
        .values()
        .map(servant_images)
        .chain(items.values().map(|x| vec![x.icon.clone()]))
        .collect();

    let queue = TaskQueue::new(options.workers)?;
    queue.run(|tasks| {
        for urls in urls {
            let (cache, resolved) = (&cache, &resolved);
            tasks.push(move |_| {
                for url in urls {
                    let local = cache.materialize(&url)?;
                    resolved
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(url, local);
                }
                Ok(())
            });
        }

        for event in recent {
            let id = event.id;
            let seen_wars = &seen_wars;
            tasks.push(move |tasks| {
                let path = options.event_path(id);
                let url = format!("{}/nice/JP/event/{}?lang=en", options.api_base, id);
                fetcher.get_file(&url, &path, false)?;

                let detail: AtlasEvent = read_json(&path)?;
                for war in detail.war_ids {
                    let new = seen_wars
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(war);
                    if new {
                        tasks.push(move |_| {
                            let url =
                                format!("{}/nice/JP/war/{}?lang=en", options.api_base, war);
                            fetcher.get_file(&url, &options.war_path(war), false)
                        });
                    }
                }
                Ok(())
            });
        }
    })?;

    let resolved = resolved.into_inner().unwrap_or_else(PoisonError::into_inner);
    rewrite_images(servants, items, &resolved);
    Ok(())
}

/// Index rewards of the recent events, returning the ones worth listing.
fn scan_events(
    options: &Options,
    recent: &[&EventSummary],
    items: &mut IdMap<ItemId, Item>,
) -> Result<Vec<GameEvent>> {
    let mut details = HashMap::new();
    let mut wars: HashMap<WarId, War> = HashMap::new();
    for event in recent {
        let detail: AtlasEvent = read_json(&options.event_path(event.id))?;
        for &war in &detail.war_ids {
            if !wars.contains_key(&war) {
                wars.insert(war, read_json::<War>(&options.war_path(war))?);
            }
        }
        details.insert(event.id, detail);
    }

    let wars = &wars;
    events::useful_events(
        recent,
        |id| {
            details
                .remove(&id)
                .with_context(|| format!("No details for event {}", id))
        },
        move |id| {
            wars.get(&id)
                .with_context(|| format!("No details for war {}", id))
        },
        items,
    )
}

fn add_drops(options: &Options, items: &mut IdMap<ItemId, Item>) -> Result<()> {
    let path = options.path("drops.json");
    if !path.exists() {
        return Ok(());
    }

    let spreadsheet: Spreadsheets = read_json(&path)?;
    for column in sheets::TABLE_COLUMNS {
        sheets::add_drop_data(items, spreadsheet.rows(), column);
    }
    Ok(())
}

fn extract_simulator_table(options: &Options, servants: &[Servant]) -> Result<()> {
    let script = fs::read_to_string(options.path("fgo_sim.js")).context("Failed to read fgo_sim.js")?;
    let table = webcrow::extract_servant_table(&script)?;
    write_json(&options.path("fgo_sim.json"), &table)?;
    webcrow::cross_check(&table, servants);
    Ok(())
}

/// Sort the merged data into its published order.
pub fn finish(
    servants: IdMap<ServantId, Servant>,
    items: IdMap<ItemId, Item>,
    events: Vec<GameEvent>,
    exp_growth: Vec<u64>,
    grail_costs: GrailCosts,
) -> DataDump {
    let mut servants: Vec<_> = servants.into_values().collect();
    servants.sort_by(|a, b| a.name.cmp(&b.name));
    let mut items: Vec<_> = items.into_values().collect();
    items.sort_by_key(|x| x.priority);

    DataDump {
        servants,
        items,
        events,
        exp_growth,
        grail_costs,
    }
}

/// Build `dump.json` in the output directory.
pub fn run(options: &Options) -> Result<()> {
    fs::create_dir_all(&options.out_dir)
        .with_context(|| format!("Failed to create {}", options.out_dir.display()))?;
    let fetcher = Fetcher::new();
    fetch_exports(options, &fetcher)?;

    let primary: Vec<AtlasServant> = read_json(&options.path("servants_jp.json"))?;
    let reference: Vec<AtlasServant> = read_json(&options.path("servants_na.json"))?;
    let event_summaries: Vec<EventSummary> = read_json(&options.path("events_jp.json"))?;
    let atlas_items: Vec<AtlasItem> = read_json(&options.path("items_na.json"))?;
    let atlas_grail_costs: AtlasGrailCosts = read_json(&options.path("grail_na.json"))?;

    let exp_growth = exp_growth(&primary);
    let grail_costs = grail_costs(&atlas_grail_costs)?;
    let converter = convert(&primary, &reference, &atlas_items)?;
    info!(
        "Converted {} servants and {} items",
        converter.servants().len(),
        converter.items().len()
    );
    let (mut servants, mut items) = converter.into_parts();
    webcrow::recompute_webcrow_ids(servants.values_mut());

    let recent = events::recent_events(&event_summaries, Utc::now());
    run_tasks(options, &fetcher, &mut servants, &mut items, &recent)?;

    let events = scan_events(options, &recent, &mut items)?;
    info!("{} of {} upcoming events grant items", events.len(), recent.len());
    add_drops(options, &mut items)?;

    let dump = finish(servants, items, events, exp_growth, grail_costs);
    if let Err(err) = extract_simulator_table(options, &dump.servants) {
        warn!("Could not read the simulator servant table: {:#}", err);
    }

    let path = options.path("dump.json");
    dump.save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}
