use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tonic::transport::Channel;

use exercise_gateway::proto::{
    CreateExerciseRequest, DeleteRequest, Exercise, ExerciseServiceClient, GetExerciseRequest,
    ListExercisesRequest, UpdateRequest,
};

#[derive(Parser)]
#[command(name = "exercise-cli")]
#[command(about = "gRPC client for the exercise gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:10000")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List exercises, optionally filtered
    List {
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        muscle_group: Option<String>,
    },
    /// Fetch one exercise
    Get { id: String },
    /// Create an exercise
    Create(Fields),
    /// Overwrite the given fields of an exercise
    Update {
        id: String,
        #[command(flatten)]
        fields: Fields,
    },
    /// Delete an exercise
    Delete { id: String },
}

#[derive(Args)]
struct Fields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    kind: Option<String>,
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long = "muscle")]
    muscles: Vec<String>,
    #[arg(long = "muscle-group")]
    muscle_groups: Vec<String>,
    #[arg(long = "image")]
    images: Vec<String>,
    #[arg(long = "video")]
    videos: Vec<String>,
}

impl Fields {
    /// The exercise and the names of the fields given on the command line.
    fn into_exercise(self) -> (Exercise, Vec<String>) {
        let mut paths = Vec::new();
        let mut mark = |given: bool, path: &str| {
            if given {
                paths.push(path.to_string());
            }
        };
        mark(self.name.is_some(), "name");
        mark(self.kind.is_some(), "kind");
        mark(!self.categories.is_empty(), "categories");
        mark(!self.muscles.is_empty(), "muscles");
        mark(!self.muscle_groups.is_empty(), "muscle_groups");
        mark(!self.images.is_empty(), "images");
        mark(!self.videos.is_empty(), "videos");

        let exercise = Exercise {
            id: String::new(),
            name: self.name.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            categories: given(self.categories),
            muscles: given(self.muscles),
            muscle_groups: given(self.muscle_groups),
            images: given(self.images),
            videos: given(self.videos),
        };
        (exercise, paths)
    }
}

fn given(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let channel = Channel::from_shared(cli.endpoint)?.connect().await?;
    let mut client = ExerciseServiceClient::new(channel);

    let result = match cli.command {
        Commands::List {
            kind,
            name,
            muscle_group,
        } => {
            let request = ListExercisesRequest {
                kind: kind.unwrap_or_default(),
                name: name.unwrap_or_default(),
                muscle_group: muscle_group.unwrap_or_default(),
            };
            print_json(client.list_exercises(request).await)
        }
        Commands::Get { id } => print_json(client.get_exercise(GetExerciseRequest { id }).await),
        Commands::Create(fields) => {
            let (exercise, _) = fields.into_exercise();
            let request = CreateExerciseRequest {
                exercise: Some(exercise),
            };
            print_json(client.create_exercise(request).await)
        }
        Commands::Update { id, fields } => {
            let (exercise, paths) = fields.into_exercise();
            let request = UpdateRequest {
                id,
                exercise: Some(exercise),
                update_mask: Some(prost_types::FieldMask { paths }),
            };
            print_json(client.update_exercise(request).await)
        }
        Commands::Delete { id } => client
            .delete_exercise(DeleteRequest { id })
            .await
            .map(|_| println!("{{}}")),
    };

    if let Err(status) = result {
        eprintln!("Error: {:?}: {}", status.code(), status.message());
        std::process::exit(1);
    }
    Ok(())
}

fn print_json<T: Serialize>(
    result: Result<tonic::Response<T>, tonic::Status>,
) -> Result<(), tonic::Status> {
    let message = result?.into_inner();
    match serde_json::to_string_pretty(&message) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: cannot render response: {}", e),
    }
    Ok(())
}
