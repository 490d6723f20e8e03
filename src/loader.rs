//! Piece type and board loading
//!
//! On-disk layout:
//!
//! ```text
//! pieces/
//!   WN/
//!     moves.txt                  optional; adjacent-cell rule when absent
//!     states/
//!       idle/config.json
//!       move/config.json
//!       long_rest/config.json
//!       move/sprites/*.png       counted for the frame strip
//! board.csv                      one row per line, piece type codes, blanks empty
//! ```
//!
//! Every failure is reported as a [`LoadError`] before any game starts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::animation::AnimationSpec;
use crate::board::Board;
use crate::consts::{DEFAULT_ANIMATION_FPS, DEFAULT_REST_MS, DEFAULT_SPEED_M_PER_S, IDLE_STATE};
use crate::error::LoadError;
use crate::moves::Moves;
use crate::settings::Settings;
use crate::sim::{
    Cell, CommandKind, GameState, Piece, PhysicsKind, PhysicsSpec, PieceTemplate, TemplateBuilder,
};

/// Physics section of a state config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// `idle`, `move`, `jump` or `rest`; inferred from the state name when absent
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub speed_m_per_sec: Option<f32>,
    pub duration_ms: Option<u64>,
    pub can_capture: Option<bool>,
    pub can_be_captured: Option<bool>,
    /// Where the completion event leads; the initial state when absent
    pub next_state_when_finished: Option<String>,
}

/// Graphics section of a state config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub fps: f32,
    #[serde(alias = "loop")]
    pub is_loop: bool,
    /// Overrides the sprite count found on disk
    pub frame_count: Option<usize>,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_ANIMATION_FPS,
            is_loop: true,
            frame_count: None,
        }
    }
}

/// Contents of `states/<name>/config.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub physics: PhysicsConfig,
    pub graphics: GraphicsConfig,
}

impl StateConfig {
    /// Resolve the physics variant and capture flags for state `name`
    pub fn physics_spec(&self, piece_type: &str, name: &str) -> Result<PhysicsSpec, LoadError> {
        let cfg = &self.physics;
        let kind_name = match &cfg.kind {
            Some(kind) => kind.to_ascii_lowercase(),
            None if name.ends_with("rest") => "rest".to_string(),
            None => name.to_ascii_lowercase(),
        };
        let kind = match kind_name.as_str() {
            "idle" => PhysicsKind::Idle,
            "move" => {
                let speed = cfg.speed_m_per_sec.unwrap_or(DEFAULT_SPEED_M_PER_S);
                if !(speed > 0.0) {
                    return Err(LoadError::piece_type(
                        piece_type,
                        format!("state {name:?}: speed must be positive, got {speed}"),
                    ));
                }
                PhysicsKind::Move { speed_m_per_s: speed }
            }
            "jump" => PhysicsKind::Jump,
            "rest" => PhysicsKind::Rest {
                duration_ms: cfg.duration_ms.unwrap_or(DEFAULT_REST_MS),
            },
            other => {
                return Err(LoadError::piece_type(
                    piece_type,
                    format!("state {name:?}: unknown physics type {other:?}"),
                ));
            }
        };
        let mut spec = PhysicsSpec::new(kind);
        if let Some(can_capture) = cfg.can_capture {
            spec = spec.capturing(can_capture);
        }
        if let Some(can_be_captured) = cfg.can_be_captured {
            spec = spec.capturable(can_be_captured);
        }
        Ok(spec)
    }

    /// Animation settings, taking the frame count from `sprite_count` unless overridden
    pub fn animation_spec(&self, sprite_count: usize) -> AnimationSpec {
        AnimationSpec {
            frame_count: self.graphics.frame_count.unwrap_or(sprite_count).max(1),
            fps: self.graphics.fps,
            looping: self.graphics.is_loop,
        }
    }
}

/// One named state ready to be wired into a template
#[derive(Debug, Clone)]
pub struct StateDef {
    pub name: String,
    pub config: StateConfig,
    pub sprite_count: usize,
}

impl StateDef {
    pub fn new(name: impl Into<String>, config: StateConfig) -> Self {
        Self {
            name: name.into(),
            config,
            sprite_count: 1,
        }
    }
}

/// Build a template from state definitions
///
/// Every pair of states is connected by the target's name, completion events
/// follow `next_state_when_finished`, and every other state can `reset` back
/// to the initial one.
pub fn build_template(
    piece_type: &str,
    board: Arc<Board>,
    defs: &[StateDef],
    moves: Option<Arc<Moves>>,
) -> Result<Arc<PieceTemplate>, LoadError> {
    let mut builder = TemplateBuilder::new(piece_type, board);
    let mut nodes = Vec::with_capacity(defs.len());
    for def in defs {
        let physics = def.config.physics_spec(piece_type, &def.name)?;
        let animation = def.config.animation_spec(def.sprite_count);
        let id = builder.add_state(&def.name, physics, animation, moves.clone())?;
        nodes.push((id, physics, def));
    }
    builder.connect_all();

    let initial = builder
        .find(IDLE_STATE)
        .ok_or_else(|| LoadError::piece_type(piece_type, "no idle state"))?;

    for (id, physics, def) in nodes {
        if let Some(done) = physics.kind.completion_kind() {
            let next = match &def.config.physics.next_state_when_finished {
                Some(next) => builder.find(next).ok_or_else(|| {
                    LoadError::piece_type(
                        piece_type,
                        format!("state {:?} finishes into unknown state {next:?}", def.name),
                    )
                })?,
                None => initial,
            };
            builder.add_transition(id, done, next)?;
        }
        if id != initial {
            builder.add_transition(id, CommandKind::Reset, initial)?;
        }
    }

    builder.set_initial(initial);
    builder.build()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Subdirectories of `dir`, sorted by name
fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))? {
        let path = entry.map_err(|e| LoadError::io(dir, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Number of files in a `sprites` directory, 1 if there is none
fn count_sprites(state_dir: &Path) -> usize {
    fs::read_dir(state_dir.join("sprites"))
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(1)
        .max(1)
}

/// Load one piece type from `<pieces_root>/<type>/`
pub fn load_piece_template(dir: &Path, board: Arc<Board>) -> Result<Arc<PieceTemplate>, LoadError> {
    let piece_type = dir_name(dir);

    let moves_path = dir.join("moves.txt");
    let moves = if moves_path.is_file() {
        Some(Arc::new(Moves::load(
            &moves_path,
            board.height_cells,
            board.width_cells,
        )?))
    } else {
        log::debug!("{piece_type}: no moves.txt, using adjacent moves");
        None
    };

    let states_dir = dir.join("states");
    let mut defs = Vec::new();
    for state_dir in sorted_subdirs(&states_dir)? {
        let config: StateConfig = read_json(&state_dir.join("config.json"))?;
        defs.push(StateDef {
            name: dir_name(&state_dir),
            config,
            sprite_count: count_sprites(&state_dir),
        });
    }
    if defs.is_empty() {
        return Err(LoadError::piece_type(&piece_type, "no states"));
    }

    let template = build_template(&piece_type, board, &defs, moves)?;
    log::info!("Loaded piece type {piece_type} ({} states)", template.states().len());
    Ok(template)
}

/// Load every piece type under `pieces_root`, keyed by type code
pub fn load_piece_templates(
    pieces_root: &Path,
    board: &Arc<Board>,
) -> Result<BTreeMap<String, Arc<PieceTemplate>>, LoadError> {
    let mut templates = BTreeMap::new();
    for dir in sorted_subdirs(pieces_root)? {
        let template = load_piece_template(&dir, Arc::clone(board))?;
        templates.insert(template.type_code.clone(), template);
    }
    Ok(templates)
}

/// A board layout: dimensions plus `(piece type, cell)` placements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLayout {
    pub rows: i32,
    pub cols: i32,
    pub placements: Vec<(String, Cell)>,
}

/// Parse a board CSV: one row per line, comma-separated type codes, blank cells empty
pub fn parse_board_layout(text: &str) -> Result<BoardLayout, LoadError> {
    let lines: Vec<&str> = text.lines().collect();
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(0, |i| i + 1);

    let mut cols = 0;
    let mut placements = Vec::new();
    for (row, line) in lines[..end].iter().enumerate() {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        cols = cols.max(cells.len());
        for (col, code) in cells.into_iter().enumerate() {
            if !code.is_empty() {
                placements.push((code.to_string(), Cell::new(row as i32, col as i32)));
            }
        }
    }
    if end == 0 || cols == 0 {
        return Err(LoadError::InvalidBoard("board file has no rows".into()));
    }
    Ok(BoardLayout {
        rows: end as i32,
        cols: cols as i32,
        placements,
    })
}

/// Read the board CSV and size the board with the configured cell scale
pub fn read_board_and_pieces(
    path: &Path,
    settings: &Settings,
) -> Result<(Board, Vec<(String, Cell)>), LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let layout = parse_board_layout(&text)?;
    let board = Board::new(
        layout.cols,
        layout.rows,
        settings.cell_size_px,
        settings.cell_size_px,
        settings.cell_size_m,
        settings.cell_size_m,
    )?;
    log::info!(
        "Board {}x{} with {} pieces from {}",
        layout.cols,
        layout.rows,
        layout.placements.len(),
        path.display()
    );
    Ok((board, layout.placements))
}

/// Stamps out pieces from loaded templates with ids `<type><n>`
#[derive(Debug, Clone, Default)]
pub struct PieceFactory {
    templates: BTreeMap<String, Arc<PieceTemplate>>,
    counters: BTreeMap<String, usize>,
}

impl PieceFactory {
    pub fn new(templates: BTreeMap<String, Arc<PieceTemplate>>) -> Self {
        Self {
            templates,
            counters: BTreeMap::new(),
        }
    }

    pub fn template(&self, piece_type: &str) -> Option<&Arc<PieceTemplate>> {
        self.templates.get(piece_type)
    }

    /// New piece of `piece_type` standing on `cell`
    pub fn create_piece(&mut self, piece_type: &str, cell: Cell) -> Result<Piece, LoadError> {
        let template = self
            .templates
            .get(piece_type)
            .ok_or_else(|| LoadError::UnknownPieceType(piece_type.to_string()))?;
        let n = self.counters.entry(piece_type.to_string()).or_insert(0);
        *n += 1;
        Ok(template.instantiate(format!("{piece_type}{n}"), cell))
    }
}

/// Place every piece of `placements` on a fresh game
pub fn build_game(
    board: Arc<Board>,
    factory: &mut PieceFactory,
    placements: &[(String, Cell)],
) -> Result<GameState, LoadError> {
    let mut state = GameState::new(Arc::clone(&board));
    for (piece_type, cell) in placements {
        if !board.contains(*cell) {
            return Err(LoadError::InvalidBoard(format!(
                "{piece_type} placed outside the board at {cell}"
            )));
        }
        state.add_piece(factory.create_piece(piece_type, *cell)?)?;
    }
    Ok(state)
}

/// Load pieces and board from disk
pub fn load_game(pieces_root: &Path, board_csv: &Path, settings: &Settings) -> Result<GameState, LoadError> {
    let (board, placements) = read_board_and_pieces(board_csv, settings)?;
    let board = Arc::new(board);
    let templates = load_piece_templates(pieces_root, &board)?;
    build_game(board, &mut PieceFactory::new(templates), &placements)
}

/// State set shared by the built-in pieces
fn demo_states() -> Vec<StateDef> {
    let physics = |kind: &str, capture: bool, capturable: bool| PhysicsConfig {
        kind: Some(kind.to_string()),
        can_capture: Some(capture),
        can_be_captured: Some(capturable),
        ..PhysicsConfig::default()
    };
    let state = |name: &str, physics: PhysicsConfig, fps: f32| {
        StateDef::new(
            name,
            StateConfig {
                physics,
                graphics: GraphicsConfig {
                    fps,
                    ..GraphicsConfig::default()
                },
            },
        )
    };
    vec![
        state("idle", physics("idle", true, true), DEFAULT_ANIMATION_FPS),
        state(
            "move",
            PhysicsConfig {
                speed_m_per_sec: Some(1.5),
                next_state_when_finished: Some("long_rest".into()),
                ..physics("move", false, true)
            },
            12.0,
        ),
        state(
            "jump",
            PhysicsConfig {
                next_state_when_finished: Some("short_rest".into()),
                ..physics("jump", false, false)
            },
            12.0,
        ),
        state(
            "long_rest",
            PhysicsConfig {
                duration_ms: Some(DEFAULT_REST_MS),
                ..physics("rest", false, true)
            },
            2.0,
        ),
        state(
            "short_rest",
            PhysicsConfig {
                duration_ms: Some(DEFAULT_REST_MS / 2),
                ..physics("rest", false, true)
            },
            2.0,
        ),
    ]
}

fn king_moves(rows: i32, cols: i32) -> Moves {
    let vectors = (-1..=1)
        .flat_map(|dr| (-1..=1).map(move |dc| (dr, dc)))
        .filter(|&d| d != (0, 0))
        .collect();
    Moves::new(vectors, rows, cols)
}

/// Built-in 8x8 game: a white (`W`) and a black (`B`) row of king-stepping pieces
pub fn demo_game(settings: &Settings) -> Result<GameState, LoadError> {
    let board = Arc::new(Board::new(
        8,
        8,
        settings.cell_size_px,
        settings.cell_size_px,
        settings.cell_size_m,
        settings.cell_size_m,
    )?);
    let moves = Arc::new(king_moves(board.height_cells, board.width_cells));
    let states = demo_states();

    let mut templates = BTreeMap::new();
    for piece_type in ["BK", "WK"] {
        let template = build_template(piece_type, Arc::clone(&board), &states, Some(Arc::clone(&moves)))?;
        templates.insert(piece_type.to_string(), template);
    }

    let placements: Vec<(String, Cell)> = (0..board.width_cells)
        .step_by(2)
        .flat_map(|col| {
            [
                ("BK".to_string(), Cell::new(0, col)),
                ("WK".to_string(), Cell::new(board.height_cells - 1, col + 1)),
            ]
        })
        .collect();

    log::info!("Using built-in demo set ({} pieces)", placements.len());
    build_game(board, &mut PieceFactory::new(templates), &placements)
}
