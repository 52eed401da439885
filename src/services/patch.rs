// Mise à jour partielle générique
//
// Un patch décrit les colonnes à modifier (champs Option) ; l'applicateur
// en fait un seul UPDATE paramétré, conditionné par un filtre (id + doctor_id).
// Pas de concaténation de noms de colonnes : tout passe par SeaORM.

use sea_orm::sea_query::SimpleExpr;
use sea_orm::{Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

pub type Assignment<E> = (<E as EntityTrait>::Column, SimpleExpr);

pub trait Patch {
    type Entity: EntityTrait;

    /// Colonnes à écrire, dans l'ordre
    fn assignments(&self) -> Vec<Assignment<Self::Entity>>;

    fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }
}

/// Applique le patch aux lignes qui satisfont `scope`.
/// Retourne le nombre de lignes modifiées (0 = ligne absente ou hors périmètre).
pub async fn apply_patch<P, C>(conn: &C, patch: &P, scope: Condition) -> Result<u64, DbErr>
where
    P: Patch,
    C: ConnectionTrait,
{
    let assignments = patch.assignments();
    if assignments.is_empty() {
        return Ok(0);
    }

    let mut update = P::Entity::update_many();
    for (column, value) in assignments {
        update = update.col_expr(column, value);
    }

    let result = update.filter(scope).exec(conn).await?;
    Ok(result.rows_affected)
}
