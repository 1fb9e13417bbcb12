use anyhow::Result;

use levain_lib::resolve::RecipeTree;

use super::Session;

pub fn cmd_tree(session: &Session, name: &str) -> Result<()> {
  let tree = RecipeTree::new(session.manager().catalog()).with_base_recipe(Some(session.base_recipe()));
  print!("{}", tree.render(name)?);
  Ok(())
}
