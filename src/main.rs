use std::process::ExitCode;

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use serde::Serialize;

use workout_coach::commands::{self, plan::GeneratePlanInput, workout};
use workout_coach::config::AppConfig;
use workout_coach::models::{MuscleGroup, TrainingGoal, Weekday};
use workout_coach::workout_log::{ExerciseLog, SetEdit};
use workout_coach::{db, AppState, CommandError};

#[derive(Parser)]
#[command(name = "workout-coach", about = "Generated training plans and strength workout logging")]
struct Cli {
  /// Database URL (overrides DATABASE_URL env var)
  #[arg(long, global = true)]
  database_url: Option<String>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Load the starter exercise catalog into an empty database
  Seed,
  /// Owner management
  User {
    #[command(subcommand)]
    command: UserCommands,
  },
  /// Training plans
  Plan {
    #[command(subcommand)]
    command: PlanCommands,
  },
  /// Log sets of one exercise
  Log {
    #[arg(long)]
    owner: i64,
    /// Exercise name or alias
    exercise: String,
    #[arg(long)]
    sets: Option<i64>,
    #[arg(long)]
    reps: Option<i64>,
    #[arg(long)]
    weight: Option<f64>,
    #[arg(long)]
    duration_seconds: Option<i64>,
    #[arg(long)]
    distance: Option<f64>,
    /// Rate of perceived exertion (1-10)
    #[arg(long)]
    rpe: Option<i64>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    warmup: bool,
    /// Muscle group to use if the exercise has to be created
    #[arg(long)]
    muscle_group: Option<MuscleGroup>,
    /// Workout date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    workout_type: Option<String>,
    /// Session start (HH:MM:SS)
    #[arg(long)]
    start_time: Option<NaiveTime>,
  },
  /// Correct the most recently logged set
  EditLast {
    #[arg(long)]
    owner: i64,
    #[arg(long)]
    reps: Option<i64>,
    #[arg(long)]
    weight: Option<f64>,
    #[arg(long)]
    rpe: Option<i64>,
    #[arg(long)]
    notes: Option<String>,
  },
  /// Recent workout totals
  Summary {
    #[arg(long)]
    owner: i64,
    #[arg(long, default_value_t = 7)]
    days: i64,
  },
}

#[derive(Subcommand)]
enum UserCommands {
  /// Create an owner
  Add { name: String },
  /// Show an owner and their streak
  Show { id: i64 },
}

#[derive(Subcommand)]
enum PlanCommands {
  /// Generate a new active plan
  Generate {
    #[arg(long)]
    owner: i64,
    /// Comma-separated weekdays, e.g. monday,wednesday,friday
    #[arg(long, value_delimiter = ',', required = true)]
    days: Vec<Weekday>,
    /// Comma-separated muscle groups, e.g. chest,back
    #[arg(long, value_delimiter = ',', required = true)]
    groups: Vec<MuscleGroup>,
    #[arg(long, value_delimiter = ',')]
    focus: Vec<MuscleGroup>,
    /// Session length in minutes
    #[arg(long, default_value_t = 60)]
    duration: i64,
    #[arg(long)]
    goal: Option<TrainingGoal>,
  },
  /// Show the active plan
  Show {
    #[arg(long)]
    owner: i64,
  },
}

fn emit<T: Serialize>(value: &T) -> Result<(), CommandError> {
  let out = serde_json::to_string_pretty(value).map_err(|e| CommandError {
    kind: "output",
    message: e.to_string(),
    attempts: None,
  })?;
  println!("{}", out);
  Ok(())
}

async fn dispatch(state: &AppState, command: Commands) -> Result<(), CommandError> {
  match command {
    Commands::Seed => {
      let inserted = commands::seed_catalog(state).await?;
      println!("Seeded {} exercises", inserted);
      Ok(())
    }
    Commands::User { command } => match command {
      UserCommands::Add { name } => emit(&commands::create_owner(state, name).await?),
      UserCommands::Show { id } => emit(&commands::get_owner(state, id).await?),
    },
    Commands::Plan { command } => match command {
      PlanCommands::Generate {
        owner,
        days,
        groups,
        focus,
        duration,
        goal,
      } => {
        let input = GeneratePlanInput {
          training_days: days,
          muscle_groups: groups,
          focus_muscle_groups: focus,
          session_duration_minutes: duration,
          goal,
        };
        emit(&commands::plan::generate_plan(state, owner, input).await?)
      }
      PlanCommands::Show { owner } => emit(&commands::plan::get_active_plan(state, owner).await?),
    },
    Commands::Log {
      owner,
      exercise,
      sets,
      reps,
      weight,
      duration_seconds,
      distance,
      rpe,
      notes,
      warmup,
      muscle_group,
      date,
      workout_type,
      start_time,
    } => {
      let entry = ExerciseLog {
        exercise_name: exercise,
        muscle_group,
        sets,
        reps,
        weight,
        duration_seconds,
        distance,
        perceived_exertion: rpe,
        notes,
        is_warmup: warmup,
        date,
        workout_type,
        start_time,
      };
      emit(&workout::log_exercise_performance(state, owner, entry).await?)
    }
    Commands::EditLast {
      owner,
      reps,
      weight,
      rpe,
      notes,
    } => {
      let edit = SetEdit {
        reps,
        weight,
        perceived_exertion: rpe,
        notes,
        ..Default::default()
      };
      emit(&workout::edit_latest_set(state, owner, edit).await?)
    }
    Commands::Summary { owner, days } => emit(&workout::get_workout_summary(state, owner, Some(days)).await?),
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .init();

  let cli = Cli::parse();

  let mut config = match AppConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      eprintln!("{}", e);
      return ExitCode::FAILURE;
    }
  };
  if let Some(url) = cli.database_url {
    config.database_url = url;
  }

  let pool = match db::initialize_db(&config.database_url).await {
    Ok(pool) => pool,
    Err(e) => {
      eprintln!("Failed to initialize database: {}", e);
      return ExitCode::FAILURE;
    }
  };

  let state = AppState::new(pool, config);
  let result = dispatch(&state, cli.command).await;
  state.db.close().await;

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("{} ({})", e.message, e.kind);
      ExitCode::FAILURE
    }
  }
}
